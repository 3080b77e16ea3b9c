pub mod api;
pub mod chat;
pub mod classifier;
pub mod config;
pub mod core_state;
pub mod knowledge;
pub mod report;
pub mod session;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::core_state::{CoreError, CoreState};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Cannot start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

pub fn run() -> Result<(), StartupError> {
    // Before tracing init: `.env` may set RUST_LOG
    let dotenv = config::load_dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    if let Err(e) = dotenv {
        tracing::warn!(error = %e, "Ignoring unreadable .env file");
    }

    let config = AppConfig::from_env()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config))
}

async fn serve(config: AppConfig) -> Result<(), StartupError> {
    let bind_addr = config.bind_addr;
    let core = Arc::new(CoreState::from_config(config)?);
    let mut server = api::start_server(core, bind_addr).await?;
    tracing::info!(addr = %server.local_addr(), "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for shutdown signal");
    }
    server.shutdown();
    server.wait().await;
    Ok(())
}
