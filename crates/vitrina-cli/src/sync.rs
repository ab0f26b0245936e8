//! The `sync` command: one manual Airtable→Supabase pass.

use vitrina_core::AppConfig;
use vitrina_store::{AirtableStore, SupabaseStore};
use vitrina_sync::{sync_products, SupabaseStateStore, SyncReport, DEFAULT_SYNC_ID};

/// Runs a single sync pass and prints the JSON report to stdout.
///
/// The report is printed for failed runs too; only setup problems (missing
/// credentials, unbuildable clients) abort before a report exists.
pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let (Some(api_key), Some(base_id), Some(service_key)) = (
        config.airtable_api_key.as_deref(),
        config.airtable_base_id.as_deref(),
        config.supabase_service_key.as_deref(),
    ) else {
        anyhow::bail!(
            "sync requires AIRTABLE_API_KEY, AIRTABLE_BASE_ID and SUPABASE_SERVICE_KEY"
        );
    };

    let source = AirtableStore::new(
        api_key,
        base_id,
        &config.airtable_table_name,
        config.request_timeout_secs,
    )?;
    let target = SupabaseStore::new(
        &config.supabase_url,
        service_key,
        config.request_timeout_secs,
    )?;
    let state_store = SupabaseStateStore::new(
        &config.supabase_url,
        service_key,
        config.request_timeout_secs,
    )?;

    let result = sync_products(&source, &target, &state_store, DEFAULT_SYNC_ID).await;
    let report = SyncReport::from_result(&result);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if result.is_err() {
        anyhow::bail!("sync run failed");
    }
    Ok(())
}
