//! In-process TTL cache over [`ImageResolver`].
//!
//! Two namespaces exist: full folder resolutions and main-image-only
//! lookups. They are keyed separately — resolving a full set does not
//! populate the cheaper main-only entry, matching the dual-granularity
//! read paths of the storefront (detail page vs. listing page).
//!
//! Reads treat expired entries as misses; physically removing them is the
//! job of [`UrlCache::sweep`], which runs before miss-driven fetches and on
//! a periodic scheduler trigger. The map is mutex-guarded because the axum
//! host serves requests concurrently; the lock is never held across an
//! `.await`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::resolver::{ImageResolver, ImageSet, PlaceholderReason, Resolution};
use crate::resolver::normalize_folder;

/// Monotonic clock, injected so TTL behavior is testable without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by [`Instant::now`].
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cache key: namespace discriminant plus the normalized folder reference.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    FullFolder(String),
    MainOnly(String),
}

impl CacheKey {
    fn full(folder_ref: &str) -> Self {
        CacheKey::FullFolder(normalize_folder(folder_ref))
    }

    fn main(folder_ref: &str) -> Self {
        CacheKey::MainOnly(normalize_folder(folder_ref))
    }
}

#[derive(Debug, Clone)]
enum CachedValue {
    Full(ImageSet),
    Main(String),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedValue,
    inserted_at: Instant,
}

/// Memoizes folder resolutions with a TTL strictly shorter than the signed
/// URLs' expiry, so a cached URL is never served after the blob store would
/// reject it.
pub struct UrlCache {
    resolver: ImageResolver,
    clock: Box<dyn Clock>,
    ttl: Duration,
    placeholder: String,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl UrlCache {
    #[must_use]
    pub fn new(
        resolver: ImageResolver,
        clock: Box<dyn Clock>,
        ttl: Duration,
        placeholder: String,
    ) -> Self {
        Self {
            resolver,
            clock,
            ttl,
            placeholder,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Full folder resolution: cover plus additional URLs.
    ///
    /// Serves from the `FullFolder` namespace within TTL; otherwise sweeps,
    /// resolves, and caches the outcome. Blob-store failures are returned
    /// as placeholder sets but never cached, so the next call retries.
    pub async fn get_full(&self, folder_ref: &str) -> ImageSet {
        let key = CacheKey::full(folder_ref);
        if let Some(CachedValue::Full(set)) = self.fresh_value(&key) {
            return set;
        }

        self.sweep();
        let resolution = self.resolver.resolve(folder_ref).await;
        let cache_it = Self::cacheable(&resolution);
        let result = resolution.into_image_set(&self.placeholder);
        if cache_it {
            self.insert(key, CachedValue::Full(result.clone()));
        }
        result
    }

    /// Main image only, for listing pages.
    ///
    /// A cold lookup still performs the full folder resolution — no cheaper
    /// partial listing exists — but only the main URL is cached, under the
    /// `MainOnly` namespace.
    pub async fn get_main(&self, folder_ref: &str) -> String {
        let key = CacheKey::main(folder_ref);
        if let Some(CachedValue::Main(url)) = self.fresh_value(&key) {
            return url;
        }

        self.sweep();
        let resolution = self.resolver.resolve(folder_ref).await;
        let cache_it = Self::cacheable(&resolution);
        let main_url = resolution.into_image_set(&self.placeholder).main_url;
        if cache_it {
            self.insert(key, CachedValue::Main(main_url.clone()));
        }
        main_url
    }

    /// Removes every entry older than the TTL. Expired entries are already
    /// invisible to reads; this reclaims the memory.
    pub fn sweep(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "swept expired URL cache entries");
        }
    }

    /// Number of live (non-expired) entries, for diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let entries = self.entries.lock().expect("cache mutex poisoned");
        entries
            .values()
            .filter(|e| now.duration_since(e.inserted_at) < self.ttl)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached value for `key` if present and unexpired.
    fn fresh_value(&self, key: &CacheKey) -> Option<CachedValue> {
        let now = self.clock.now();
        let entries = self.entries.lock().expect("cache mutex poisoned");
        entries
            .get(key)
            .filter(|entry| now.duration_since(entry.inserted_at) < self.ttl)
            .map(|entry| entry.value.clone())
    }

    fn insert(&self, key: CacheKey, value: CachedValue) {
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
        };
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key, entry);
    }

    /// Resolved sets and genuinely-empty folders are cacheable; store
    /// errors are not (no negative caching of failures).
    fn cacheable(resolution: &Resolution) -> bool {
        !matches!(
            resolution,
            Resolution::Placeholder(PlaceholderReason::StoreError(_))
        )
    }
}
