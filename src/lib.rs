pub mod api;
pub mod config;
pub mod engine_state;
pub mod pipeline;
pub mod questionnaire;
pub mod session;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::{start_server, ApiContext, ServerError};
use crate::config::{AppConfig, ConfigError};
use crate::engine_state::EngineInitError;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine initialisation failed: {0}")]
    EngineInit(#[from] EngineInitError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Start the triage assistant: load config, build the engine, serve until
/// Ctrl-C.
///
/// The engine is built before the async runtime starts; its HTTP clients
/// are blocking and must not be created inside the runtime.
pub fn run() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    let engine = engine_state::engine_or_init(&config)?;
    tracing::info!(
        documents = engine.stats.documents,
        chunks = engine.stats.chunks,
        model = %engine.model,
        "Query engine ready"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(RunError::Runtime)?;

    runtime.block_on(async {
        let mut server = start_server(ApiContext::new(engine), config.bind_addr).await?;
        tracing::info!(url = %format!("http://{}", server.addr), "Open the questionnaire in a browser");

        tokio::signal::ctrl_c().await.map_err(RunError::Signal)?;
        server.shutdown();
        server.stopped().await?;
        Ok::<(), RunError>(())
    })
}
