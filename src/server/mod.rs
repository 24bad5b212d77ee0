//! HTTP API exposing the chat engine.

mod handlers;
mod router;

pub use router::build_router;

use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;

use crate::error::AppError;
use crate::models::ServerConfig;
use crate::services::ChatEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: ChatEngine,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: ChatEngine) -> Self {
        Self {
            engine,
            started_at: Instant::now(),
        }
    }
}

pub struct ChatServer {
    addr: SocketAddr,
    max_body_size: usize,
    engine: ChatEngine,
}

impl ChatServer {
    pub fn new(config: &ServerConfig, engine: ChatEngine) -> Result<Self, AppError> {
        let (host, port) = (&config.host, config.port);
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| AppError::Startup(format!("invalid bind address {host}:{port}: {e}")))?;

        Ok(Self {
            addr,
            max_body_size: config.max_body_size,
            engine,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(AppState::new(self.engine), self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| AppError::Startup(format!("failed to bind {}: {e}", self.addr)))?;
        tracing::info!("chat API listening on http://{}", self.addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("chat API shutting down");
            })
            .await
            .map_err(|e| AppError::Other(format!("server error: {e}")))
    }
}
