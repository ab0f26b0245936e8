use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let supabase_url = require("SUPABASE_URL")?;
    let supabase_anon_key = require("SUPABASE_ANON_KEY")?;
    let supabase_service_key = lookup("SUPABASE_SERVICE_KEY").ok();

    let airtable_api_key = lookup("AIRTABLE_API_KEY").ok();
    let airtable_base_id = lookup("AIRTABLE_BASE_ID").ok();
    let airtable_table_name = or_default("AIRTABLE_TABLE_NAME", "Table 1");

    let aws_access_key_id = require("AWS_ACCESS_KEY_ID")?;
    let aws_secret_access_key = require("AWS_SECRET_ACCESS_KEY")?;
    let s3_bucket_name = require("S3_BUCKET_NAME")?;
    let s3_region = require("S3_REGION")?;

    let env = parse_environment(&or_default("VITRINA_ENV", "development"));
    let bind_addr = parse_addr("VITRINA_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("VITRINA_LOG_LEVEL", "info");

    let url_expiration_secs = parse_u64("VITRINA_URL_EXPIRATION_SECS", "10800")?;
    let cache_safety_margin_secs = parse_u64("VITRINA_CACHE_SAFETY_MARGIN_SECS", "300")?;
    let request_timeout_secs = parse_u64("VITRINA_REQUEST_TIMEOUT_SECS", "30")?;
    let placeholder_path = or_default("VITRINA_PLACEHOLDER_PATH", "/static/img/placeholder.jpg");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        supabase_url,
        supabase_anon_key,
        supabase_service_key,
        airtable_api_key,
        airtable_base_id,
        airtable_table_name,
        aws_access_key_id,
        aws_secret_access_key,
        s3_bucket_name,
        s3_region,
        url_expiration_secs,
        cache_safety_margin_secs,
        request_timeout_secs,
        placeholder_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
