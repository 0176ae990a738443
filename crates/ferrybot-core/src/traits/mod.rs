// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits injected into handlers at construction.
//!
//! No ambient singletons: the cache, the agent client, and the desk-sync
//! target are explicit dependencies so each handler can be tested against
//! mocks in isolation.

pub mod agent;
pub mod cache;
pub mod desk;

pub use agent::AgentClient;
pub use cache::KeyValueCache;
pub use desk::{DeskContact, DeskMessage, DeskSync};
