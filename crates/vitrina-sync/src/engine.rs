//! The source→target synchronization pass.
//!
//! Pulls the full product set from both stores, hashes each source product
//! over its tracked field subset, and writes only what changed since the
//! previous run. The hash map persisted at the end is built from this run
//! alone — names that vanished from the source drop out of it, and the
//! target is never touched for them.

use std::collections::HashMap;

use vitrina_core::Product;
use vitrina_store::{ProductFilter, ProductStore};

use crate::error::SyncError;
use crate::hash::product_hash;
use crate::state::SyncStateStore;

/// Sync id under which the scheduler and CLI persist their state row.
pub const DEFAULT_SYNC_ID: &str = "last_sync";

/// Counters for one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub total_processed: usize,
}

/// Runs one synchronization pass from `source` to `target`.
///
/// Per-product write failures are counted and logged but do not abort the
/// pass. A failed product's hash is recorded only after its write succeeds,
/// so a failure is retried on the next run rather than silently treated as
/// synced.
///
/// # Errors
///
/// Returns [`SyncError`] if listing either store or loading the prior state
/// fails, or if the new state cannot be persisted. No partial state is
/// saved in the failure cases.
pub async fn sync_products(
    source: &dyn ProductStore,
    target: &dyn ProductStore,
    state_store: &dyn SyncStateStore,
    sync_id: &str,
) -> Result<SyncStats, SyncError> {
    let source_products = source.list_all(ProductFilter::all()).await?;
    tracing::info!(count = source_products.len(), "fetched source products");

    let target_products = target.list_all(ProductFilter::all()).await?;
    tracing::info!(count = target_products.len(), "fetched target products");

    let target_index: HashMap<String, Product> = target_products
        .into_iter()
        .filter(|p| !p.name.is_empty())
        .map(|p| (p.name.clone(), p))
        .collect();

    let prior_state = state_store.load(sync_id).await?;

    let mut stats = SyncStats {
        total_processed: source_products.len(),
        ..SyncStats::default()
    };
    let mut new_state: HashMap<String, String> = HashMap::new();

    for product in &source_products {
        if product.name.is_empty() {
            continue;
        }

        let current_hash = product_hash(product);
        if prior_state.get(&product.name) == Some(&current_hash) {
            stats.skipped += 1;
            new_state.insert(product.name.clone(), current_hash);
            continue;
        }

        let outcome = match existing_id(&target_index, &product.name) {
            Some(id) => target.update(id, product).await.map(|_| Outcome::Updated),
            None => target.insert(product).await.map(|_| Outcome::Created),
        };

        match outcome {
            Ok(Outcome::Updated) => {
                stats.updated += 1;
                new_state.insert(product.name.clone(), current_hash);
                tracing::info!(name = %product.name, "updated product");
            }
            Ok(Outcome::Created) => {
                stats.created += 1;
                new_state.insert(product.name.clone(), current_hash);
                tracing::info!(name = %product.name, "created product");
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(name = %product.name, error = %e, "failed to sync product");
            }
        }
    }

    state_store.save(sync_id, &new_state).await?;
    tracing::info!(
        created = stats.created,
        updated = stats.updated,
        skipped = stats.skipped,
        errors = stats.errors,
        total = stats.total_processed,
        "sync pass complete"
    );
    Ok(stats)
}

enum Outcome {
    Created,
    Updated,
}

/// The target-store id for `name`, when the target has the record and the
/// record carries an id.
fn existing_id<'a>(index: &'a HashMap<String, Product>, name: &str) -> Option<&'a str> {
    index.get(name).and_then(|p| p.id.as_deref())
}
