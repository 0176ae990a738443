// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the callback shell.
//!
//! The agent treats any non-200 as fatal and stops delivering, so the
//! callback endpoint answers 200 unconditionally: malformed bodies, unknown
//! tokens, and pipeline errors are logged and acknowledged with the
//! `ignored` flag.

use axum::extract::{Path, State};
use axum::Json;
use ferrybot_core::{AgentEvent, EventContext};
use ferrybot_storage::queries::bots;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::server::GatewayState;

/// Response body for POST /callback/{token}.
#[derive(Debug, Serialize)]
pub struct CallbackAck {
    pub status: &'static str,
    /// The event was dropped without running the pipeline.
    pub ignored: bool,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

fn ack(ignored: bool) -> Json<CallbackAck> {
    Json(CallbackAck {
        status: "ok",
        ignored,
    })
}

/// POST /callback/{token}
pub async fn post_callback(
    State(state): State<GatewayState>,
    Path(token): Path<String>,
    body: String,
) -> Json<CallbackAck> {
    let event: AgentEvent = match serde_json::from_str(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "unparseable callback body");
            return ack(true);
        }
    };

    let bot = match bots::by_callback_token(&state.db, &token).await {
        Ok(Some(bot)) => bot,
        Ok(None) => {
            warn!("callback with unknown token");
            return ack(true);
        }
        Err(e) => {
            error!(error = %e, "bot lookup failed");
            return ack(true);
        }
    };

    let mut ctx = EventContext::new(event, bot.identity());
    debug!(kind = %ctx.message_kind, bot = %ctx.bot.wxid, "event accepted");
    if let Err(e) = state.runner.run(&mut ctx).await {
        error!(kind = %ctx.original_kind, error = %e, "pipeline error");
    }
    ack(false)
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
