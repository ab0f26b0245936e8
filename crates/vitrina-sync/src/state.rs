//! Persisted sync state: the product-name → hash map from the last run.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::SyncError;

const TABLE: &str = "sync_state";

/// Durable store for the per-run hash map. Survives process restarts; the
/// whole map is replaced on every save.
#[async_trait]
pub trait SyncStateStore: Send + Sync {
    /// Loads the hash map saved under `sync_id`. A missing row is an empty
    /// map (first run), not an error.
    async fn load(&self, sync_id: &str) -> Result<HashMap<String, String>, SyncError>;

    /// Replaces the hash map saved under `sync_id`.
    async fn save(&self, sync_id: &str, state: &HashMap<String, String>)
        -> Result<(), SyncError>;
}

/// State store backed by a `sync_state` table in the Supabase project,
/// one row per sync id with the map in a JSON column.
pub struct SupabaseStateStore {
    http: Client,
    base_url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct StateRow {
    #[serde(default)]
    state: HashMap<String, String>,
}

impl SupabaseStateStore {
    /// Creates a state store for the Supabase project at `base_url`.
    /// Writes require the service-role key.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Http`] if the HTTP client cannot be built, or
    /// [`SyncError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, SyncError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SyncError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_owned(),
        })
    }

    fn table_url(&self) -> Result<Url, SyncError> {
        self.base_url
            .join(&format!("rest/v1/{TABLE}"))
            .map_err(|e| SyncError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl SyncStateStore for SupabaseStateStore {
    async fn load(&self, sync_id: &str) -> Result<HashMap<String, String>, SyncError> {
        let mut url = self.table_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "state");
            pairs.append_pair("sync_id", &format!("eq.{sync_id}"));
            pairs.append_pair("limit", "1");
        }

        let response = self
            .http
            .get(url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        let rows: Vec<StateRow> =
            serde_json::from_str(&body).map_err(|e| SyncError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;
        Ok(rows.into_iter().next().map(|r| r.state).unwrap_or_default())
    }

    async fn save(
        &self,
        sync_id: &str,
        state: &HashMap<String, String>,
    ) -> Result<(), SyncError> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("on_conflict", "sync_id");

        let body = serde_json::json!({
            "sync_id": sync_id,
            "state": state,
            "updated_at": Utc::now().to_rfc3339(),
        });
        let response = self
            .http
            .post(url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory state store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with a prior state, as if a previous run had saved it.
    #[must_use]
    pub fn with_state(sync_id: &str, state: HashMap<String, String>) -> Self {
        let store = Self::new();
        store
            .states
            .lock()
            .expect("state mutex poisoned")
            .insert(sync_id.to_owned(), state);
        store
    }

    /// Returns the saved state for `sync_id`, if any. Test inspection hook.
    #[must_use]
    pub fn saved(&self, sync_id: &str) -> Option<HashMap<String, String>> {
        self.states
            .lock()
            .expect("state mutex poisoned")
            .get(sync_id)
            .cloned()
    }
}

#[async_trait]
impl SyncStateStore for MemoryStateStore {
    async fn load(&self, sync_id: &str) -> Result<HashMap<String, String>, SyncError> {
        Ok(self.saved(sync_id).unwrap_or_default())
    }

    async fn save(
        &self,
        sync_id: &str,
        state: &HashMap<String, String>,
    ) -> Result<(), SyncError> {
        self.states
            .lock()
            .expect("state mutex poisoned")
            .insert(sync_id.to_owned(), state.clone());
        Ok(())
    }
}
