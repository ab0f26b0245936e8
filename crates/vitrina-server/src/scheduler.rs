//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring maintenance jobs: expired-entry sweeps of the image URL
//! cache, category refreshes, and (when the Airtable credentials are
//! configured) the product sync run.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};

use vitrina_core::AppConfig;
use vitrina_images::UrlCache;
use vitrina_store::{AirtableStore, ProductStore, SupabaseStore};
use vitrina_sync::{sync_products, SupabaseStateStore, SyncReport, DEFAULT_SYNC_ID};

use crate::categories::CategoryCache;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Fails if the scheduler cannot be initialised or started, or if the
/// sync credentials are configured but a sync client cannot be built.
pub async fn build_scheduler(
    images: Arc<UrlCache>,
    categories: Arc<CategoryCache>,
    products: Arc<dyn ProductStore>,
    config: Arc<AppConfig>,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    register_cache_sweep_job(&scheduler, images).await?;
    register_category_refresh_job(&scheduler, categories, products).await?;

    if config.sync_configured() {
        register_sync_job(&scheduler, &config).await?;
    } else {
        tracing::info!("sync credentials not configured; sync job disabled");
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Sweeps expired image URL cache entries every 30 minutes. Expired
/// entries are already invisible to reads; the sweep reclaims the memory.
async fn register_cache_sweep_job(
    scheduler: &JobScheduler,
    images: Arc<UrlCache>,
) -> anyhow::Result<()> {
    let job = Job::new_async("0 */30 * * * *", move |_uuid, _lock| {
        let images = Arc::clone(&images);
        Box::pin(async move {
            images.sweep();
            tracing::debug!(entries = images.len(), "scheduler: cache sweep complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Refreshes the cached category names every 30 minutes, offset from the
/// cache sweep so the two jobs do not always fire together.
async fn register_category_refresh_job(
    scheduler: &JobScheduler,
    categories: Arc<CategoryCache>,
    products: Arc<dyn ProductStore>,
) -> anyhow::Result<()> {
    let job = Job::new_async("0 5,35 * * * *", move |_uuid, _lock| {
        let categories = Arc::clone(&categories);
        let products = Arc::clone(&products);
        Box::pin(async move {
            categories.refresh(products.as_ref()).await;
            tracing::debug!("scheduler: category refresh complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Runs the Airtable→Supabase product sync every 15 minutes.
///
/// Only registered when both the Airtable credentials and the Supabase
/// service-role key are present. A failed run is logged and retried on
/// the next trigger.
async fn register_sync_job(scheduler: &JobScheduler, config: &AppConfig) -> anyhow::Result<()> {
    let (Some(api_key), Some(base_id), Some(service_key)) = (
        config.airtable_api_key.as_deref(),
        config.airtable_base_id.as_deref(),
        config.supabase_service_key.as_deref(),
    ) else {
        anyhow::bail!("sync job requires Airtable credentials and the Supabase service key");
    };

    let source = Arc::new(AirtableStore::new(
        api_key,
        base_id,
        &config.airtable_table_name,
        config.request_timeout_secs,
    )?);
    let target = Arc::new(SupabaseStore::new(
        &config.supabase_url,
        service_key,
        config.request_timeout_secs,
    )?);
    let state_store = Arc::new(SupabaseStateStore::new(
        &config.supabase_url,
        service_key,
        config.request_timeout_secs,
    )?);

    let job = Job::new_async("0 */15 * * * *", move |_uuid, _lock| {
        let source = Arc::clone(&source);
        let target = Arc::clone(&target);
        let state_store = Arc::clone(&state_store);

        Box::pin(async move {
            tracing::info!("scheduler: starting product sync run");
            let result = sync_products(
                source.as_ref(),
                target.as_ref(),
                state_store.as_ref(),
                DEFAULT_SYNC_ID,
            )
            .await;

            let report = SyncReport::from_result(&result);
            match result {
                Ok(stats) => tracing::info!(
                    created = stats.created,
                    updated = stats.updated,
                    skipped = stats.skipped,
                    errors = stats.errors,
                    "scheduler: product sync run complete"
                ),
                Err(e) => tracing::error!(
                    error = %e,
                    report = %serde_json::to_string(&report).unwrap_or_default(),
                    "scheduler: product sync run failed"
                ),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
