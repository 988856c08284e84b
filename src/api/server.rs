//! Triage server lifecycle: bind → spawn background task → return handle
//! with shutdown channel.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::triage_router;
use crate::api::types::ApiContext;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to get server address: {0}")]
    LocalAddr(std::io::Error),

    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Handle to a running triage server.
pub struct TriageServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TriageServer {
    /// Ask the server to stop accepting connections and drain.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Triage server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn stopped(self) -> Result<(), ServerError> {
        self.task.await?;
        Ok(())
    }
}

/// Bind `addr` and serve the triage router in a background task.
pub async fn start_server(ctx: ApiContext, addr: SocketAddr) -> Result<TriageServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    let app = triage_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Triage server received shutdown signal");
        };

        tracing::info!(%addr, "Triage server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Triage server error: {e}");
        }

        tracing::info!("Triage server stopped");
    });

    Ok(TriageServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
