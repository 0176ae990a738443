// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrow interface to the support-desk sync target.

use async_trait::async_trait;

use crate::error::FerrybotError;
use crate::event::BotIdentity;

/// A contact mirrored to the support desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskContact {
    pub wxid: String,
    pub name: String,
    pub avatar: String,
    pub is_room: bool,
}

/// A message mirrored to the support desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskMessage {
    pub sender: String,
    /// Empty for direct messages.
    pub room_id: String,
    pub content: String,
    /// True when the bot itself authored the message.
    pub outgoing: bool,
}

/// Support-desk sync target.
///
/// Calls are made from the background job worker, never from the inbound
/// request path; failures are logged and do not affect the inbound 200.
#[async_trait]
pub trait DeskSync: Send + Sync {
    /// Create the contact on the desk side if it does not exist yet.
    async fn ensure_contact(
        &self,
        bot: &BotIdentity,
        contact: &DeskContact,
    ) -> Result<(), FerrybotError>;

    /// Mirror one message into the desk conversation.
    async fn sync_message(
        &self,
        bot: &BotIdentity,
        message: &DeskMessage,
    ) -> Result<(), FerrybotError>;
}
