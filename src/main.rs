use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tip_steward::api::{AppState, create_router};
use tip_steward::config::{ConfigLoader, LogFormat};

/// Environment variable naming the YAML configuration file.
const CONFIG_PATH_VAR: &str = "TIP_STEWARD_CONFIG";

fn init_logging(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tip_steward=info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().with_target(false).json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loader = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) if !path.trim().is_empty() => ConfigLoader::load(path.trim())?,
        _ => ConfigLoader::from_env()?,
    };
    let config = loader.into_config();

    init_logging(config.log_format);

    let bind = config.server.bind.clone();
    tracing::info!(
        bind = %bind,
        engine = %config.ocr.engine,
        azure_configured = config.ocr.azure.has_credentials(),
        "Starting Tip Steward"
    );

    let state = AppState::from_config(config)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Tip Steward stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
