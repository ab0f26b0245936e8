//! Cached list of active category names for the storefront navigation.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use vitrina_store::{ProductFilter, ProductStore};

/// Distinct categories of active products, memoized with a TTL.
///
/// Refreshing requires a full product listing, so the names are cached and
/// refreshed lazily on read or eagerly by the scheduler. On a backend
/// failure the previous value keeps being served; an empty cache degrades
/// to an empty list.
pub struct CategoryCache {
    ttl: Duration,
    inner: Mutex<Option<CachedCategories>>,
}

struct CachedCategories {
    names: Vec<String>,
    fetched_at: Instant,
}

impl CategoryCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(None),
        }
    }

    /// Returns the category names, refreshing from `store` when the cached
    /// value is missing or older than the TTL.
    pub async fn get(&self, store: &dyn ProductStore) -> Vec<String> {
        if let Some(names) = self.fresh() {
            return names;
        }
        self.refresh(store).await;
        self.any().unwrap_or_default()
    }

    /// Fetches the distinct categories of active products and replaces the
    /// cached value. A listing failure leaves the previous value in place.
    pub async fn refresh(&self, store: &dyn ProductStore) {
        match store.list_all(ProductFilter::active()).await {
            Ok(products) => {
                let mut names: Vec<String> = products
                    .into_iter()
                    .map(|p| p.category)
                    .filter(|c| !c.is_empty())
                    .collect();
                names.sort();
                names.dedup();
                let mut inner = self.inner.lock().expect("category mutex poisoned");
                *inner = Some(CachedCategories {
                    names,
                    fetched_at: Instant::now(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "category refresh failed; keeping previous value");
            }
        }
    }

    fn fresh(&self) -> Option<Vec<String>> {
        let inner = self.inner.lock().expect("category mutex poisoned");
        inner
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.names.clone())
    }

    fn any(&self) -> Option<Vec<String>> {
        let inner = self.inner.lock().expect("category mutex poisoned");
        inner.as_ref().map(|cached| cached.names.clone())
    }
}
