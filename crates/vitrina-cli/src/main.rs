mod resolve;
mod sync;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "vitrina-cli")]
#[command(about = "Vitrina storefront command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one Airtable→Supabase product sync pass and print the report
    Sync,
    /// Resolve an image folder to its presigned URLs
    Resolve {
        /// Image folder URL or prefix, as stored in `imagenes_s3`
        folder: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = vitrina_core::load_app_config_from_env()?;

    match cli.command {
        Commands::Sync => sync::run(&config).await,
        Commands::Resolve { folder } => resolve::run(&config, &folder).await,
    }
}
