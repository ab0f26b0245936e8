//! The `resolve` command: inspect what a folder reference resolves to.

use std::sync::Arc;
use std::time::Duration;

use vitrina_core::AppConfig;
use vitrina_images::{ImageResolver, Resolution, S3Gateway};

/// Resolves `folder` against the configured bucket and prints the outcome.
pub async fn run(config: &AppConfig, folder: &str) -> anyhow::Result<()> {
    let gateway = S3Gateway::new(
        &config.s3_bucket_name,
        &config.s3_region,
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        config.request_timeout_secs,
    )?;
    let resolver = ImageResolver::new(
        Arc::new(gateway),
        Duration::from_secs(config.url_expiration_secs),
    );

    match resolver.resolve(folder).await {
        Resolution::Resolved(set) => {
            println!("main: {}", set.main_url);
            for url in &set.additional_urls {
                println!("  {url}");
            }
        }
        Resolution::Placeholder(reason) => {
            println!("placeholder ({reason:?})");
        }
    }
    Ok(())
}
