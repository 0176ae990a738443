// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound command surface of the IM-automation agent.
//!
//! The agent itself is a black box: it emits inbound events and executes
//! these commands. Handlers never talk HTTP directly; they go through this
//! trait so tests can record outbound traffic.

use async_trait::async_trait;

use crate::error::FerrybotError;
use crate::event::BotIdentity;

#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Send a text message to a user or room.
    async fn send_text(
        &self,
        bot: &BotIdentity,
        target: &str,
        content: &str,
    ) -> Result<(), FerrybotError>;

    /// Accept an inbound payment transfer.
    async fn accept_payment(
        &self,
        bot: &BotIdentity,
        transfer_id: &str,
    ) -> Result<(), FerrybotError>;

    /// Refund an inbound payment transfer.
    async fn refund_payment(
        &self,
        bot: &BotIdentity,
        transfer_id: &str,
    ) -> Result<(), FerrybotError>;

    /// Ask the agent to transcribe a voice message; the transcript arrives
    /// later as its own inbound event.
    async fn request_voice_transcript(
        &self,
        bot: &BotIdentity,
        msgid: u64,
    ) -> Result<(), FerrybotError>;

    /// Trigger a full contact-list sync from the agent.
    async fn sync_contacts(&self, bot: &BotIdentity) -> Result<(), FerrybotError>;

    /// Whether the bot's IM session is currently online.
    async fn check_online(&self, bot: &BotIdentity) -> Result<bool, FerrybotError>;
}
