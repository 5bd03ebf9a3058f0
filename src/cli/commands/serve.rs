use anyhow::Context;
use clap::Args;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::handlers;
use crate::services::ApiService;

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides DMS_API_PORT)")]
    pub port: Option<u16>,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    serve(config).await
}

/// Loads the schema, builds the pipelines and serves until the process ends
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    if let Err(errors) = config.validate() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Invalid configuration: {}", messages.join("; "));
    }
    tracing::info!("Starting DMS in {:?} mode", config.environment);

    let service = ApiService::from_config(&config).context("Failed to load ApiSchema")?;
    let app = handlers::app(Arc::new(service), &config.api);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!("DMS listening on http://{}/{}", bind_addr, config.api.path_base);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
