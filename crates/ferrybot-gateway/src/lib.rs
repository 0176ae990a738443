// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP callback shell plus the agent-lifecycle pipeline handlers.

pub mod handlers;
pub mod roster;
pub mod server;
pub mod session;

pub use roster::RosterSyncHandler;
pub use server::{GatewayState, ServerConfig, router, start_server};
pub use session::SessionStateHandler;
