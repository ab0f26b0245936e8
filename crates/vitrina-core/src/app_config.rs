use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,

    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Service-role key for writes during sync. Optional: the read-only
    /// storefront runs without it.
    pub supabase_service_key: Option<String>,

    pub airtable_api_key: Option<String>,
    pub airtable_base_id: Option<String>,
    pub airtable_table_name: String,

    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub s3_bucket_name: String,
    pub s3_region: String,

    /// Lifetime of presigned image URLs, in seconds.
    pub url_expiration_secs: u64,
    /// Cache TTL is `url_expiration_secs` minus this margin, so a cached
    /// URL is never served past the point the blob store would reject it.
    pub cache_safety_margin_secs: u64,
    pub request_timeout_secs: u64,
    pub placeholder_path: String,
}

impl AppConfig {
    /// Returns `true` if Airtable credentials are configured, i.e. the
    /// Airtable→Supabase sync can run.
    #[must_use]
    pub fn sync_configured(&self) -> bool {
        self.airtable_api_key.is_some()
            && self.airtable_base_id.is_some()
            && self.supabase_service_key.is_some()
    }

    /// The URL cache TTL derived from the presign expiry and safety margin,
    /// clamped to at least one minute.
    #[must_use]
    pub fn cache_ttl_secs(&self) -> u64 {
        self.url_expiration_secs
            .saturating_sub(self.cache_safety_margin_secs)
            .max(60)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &"[redacted]")
            .field(
                "supabase_service_key",
                &self.supabase_service_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "airtable_api_key",
                &self.airtable_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("airtable_base_id", &self.airtable_base_id)
            .field("airtable_table_name", &self.airtable_table_name)
            .field("aws_access_key_id", &"[redacted]")
            .field("aws_secret_access_key", &"[redacted]")
            .field("s3_bucket_name", &self.s3_bucket_name)
            .field("s3_region", &self.s3_region)
            .field("url_expiration_secs", &self.url_expiration_secs)
            .field("cache_safety_margin_secs", &self.cache_safety_margin_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("placeholder_path", &self.placeholder_path)
            .finish()
    }
}
