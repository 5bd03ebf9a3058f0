use tracing_subscriber::EnvFilter;

use edfi_dms_rust::cli::commands::serve::serve;
use edfi_dms_rust::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DMS_API_SCHEMA_PATH, DMS_API_PORT, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    serve(AppConfig::from_env()).await
}
