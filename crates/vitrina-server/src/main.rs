mod api;
mod categories;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use vitrina_images::{ImageResolver, S3Gateway, SystemClock, UrlCache};
use vitrina_store::{ProductStore, SupabaseStore};

use crate::api::{build_app, AppState};
use crate::categories::CategoryCache;

/// How long the distinct-category list is served before a re-fetch.
const CATEGORY_TTL: Duration = Duration::from_secs(30 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(vitrina_core::load_app_config_from_env()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

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
    let images = Arc::new(UrlCache::new(
        resolver,
        Box::new(SystemClock),
        Duration::from_secs(config.cache_ttl_secs()),
        config.placeholder_path.clone(),
    ));

    let products: Arc<dyn ProductStore> = Arc::new(SupabaseStore::new(
        &config.supabase_url,
        &config.supabase_anon_key,
        config.request_timeout_secs,
    )?);
    let categories = Arc::new(CategoryCache::new(CATEGORY_TTL));

    let _scheduler = scheduler::build_scheduler(
        Arc::clone(&images),
        Arc::clone(&categories),
        Arc::clone(&products),
        Arc::clone(&config),
    )
    .await?;

    let app = build_app(AppState {
        products,
        images,
        categories,
        placeholder: config.placeholder_path.clone(),
    });

    tracing::info!(addr = %config.bind_addr, env = %config.env, "starting vitrina server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
