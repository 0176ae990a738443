// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound dispatch: keyword resources, desk-sync, signed webhooks.

pub mod clients;
pub mod desk;
pub mod keyword;
pub mod webhook;

pub use clients::{HttpAgentClient, HttpDeskSync};
pub use desk::{DESK_SYNC_QUEUE, DeskJob, DeskSyncHandler, DeskSyncWorker, enqueue_desk_job};
pub use keyword::{DEDUP_TTL, KeywordResourceHandler};
pub use webhook::{
    SIGNATURE_HEADER, WebhookForwardHandler, WebhookPayload, WebhookSender, sign,
};
