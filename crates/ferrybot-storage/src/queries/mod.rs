// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod bots;
pub mod checkins;
pub mod contacts;
pub mod jobs;
pub mod resources;
pub mod settings;
pub mod subscriptions;
