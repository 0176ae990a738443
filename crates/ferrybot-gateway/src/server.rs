// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes and shared state for the callback shell.

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use ferrybot_core::{FerrybotError, PipelineRunner};
use ferrybot_storage::Database;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Storage handle for bot resolution.
    pub db: Database,
    /// The configured three-stage pipeline.
    pub runner: Arc<PipelineRunner>,
    /// Process start time for uptime reporting.
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(db: Database, runner: Arc<PipelineRunner>) -> Self {
        Self {
            db,
            runner,
            started_at: Instant::now(),
        }
    }
}

/// Gateway server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the gateway router.
///
/// - `POST /callback/{token}` — inbound agent events, always 200.
/// - `GET /health` — unauthenticated status for process supervisors.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/callback/{token}", post(handlers::post_callback))
        .route("/health", get(handlers::get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the shutdown token fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), FerrybotError> {
    let app = router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FerrybotError::Delivery {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| FerrybotError::Delivery {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
