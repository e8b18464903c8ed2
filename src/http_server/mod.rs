//! HTTP query API over the correlation statistics.

mod error;
mod stats;

use std::{net::SocketAddr, sync::Arc};

use axum::{Json, Router, response::IntoResponse, routing::get};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use error::ApiError;

use crate::{config::AppConfig, engine::correlation_service::StatsHandle};

/// Shared state of the request handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Client of the correlation service.
    pub handle: StatsHandle,
    /// Application configuration.
    pub config: Arc<AppConfig>,
}

/// Errors that stop the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured listen address is not a socket address.
    #[error("Invalid server.listen_address '{address}': {source}")]
    InvalidAddress {
        /// The configured value.
        address: String,
        /// The parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Binding or serving failed.
    #[error("HTTP server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

async fn index() -> &'static str {
    "Ok!"
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Builds the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/all", get(stats::all_stats))
        .route("/latest", get(stats::latest_stats))
        .with_state(state)
}

/// Serves the API on `listener` until the token is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: ApiState,
    cancellation_token: CancellationToken,
) -> Result<(), ServerError> {
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "HTTP server listening.");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(async move {
            cancellation_token.cancelled().await;
            tracing::info!("HTTP server received shutdown signal.");
        })
        .await?;

    Ok(())
}

/// Binds the configured listen address and serves the API.
pub async fn run_server_from_config(
    config: Arc<AppConfig>,
    handle: StatsHandle,
    cancellation_token: CancellationToken,
) -> Result<(), ServerError> {
    let address = config.server.listen_address.clone();
    let addr: SocketAddr = address
        .parse()
        .map_err(|source| ServerError::InvalidAddress { address: address.clone(), source })?;

    let listener = TcpListener::bind(addr).await?;
    serve(listener, ApiState { handle, config }, cancellation_token).await
}
