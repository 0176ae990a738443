// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Ferrybot integration tests.
//!
//! Provides mock collaborators and a temp-database harness for fast,
//! deterministic, CI-runnable tests without a live agent or desk.
//!
//! # Components
//!
//! - [`TestHarness`] - Temp SQLite database with one provisioned bot
//! - [`RecordingAgentClient`] - Agent mock that captures outbound commands
//! - [`RecordingDeskSync`] - Desk-sync mock that captures mirrored traffic

pub mod harness;
pub mod mock_agent;
pub mod mock_desk;

pub use harness::TestHarness;
pub use mock_agent::{RecordingAgentClient, SentText};
pub use mock_desk::RecordingDeskSync;
