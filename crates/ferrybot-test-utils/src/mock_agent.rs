// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock agent client for deterministic testing.
//!
//! `RecordingAgentClient` implements `AgentClient` and captures every
//! outbound command so tests can assert on what the gateway sent.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ferrybot_core::traits::AgentClient;
use ferrybot_core::{BotIdentity, FerrybotError};

/// One captured `send_text` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    pub target: String,
    pub content: String,
}

/// An agent mock that records outbound traffic instead of sending it.
pub struct RecordingAgentClient {
    sent: Arc<Mutex<Vec<SentText>>>,
    accepted_payments: Arc<Mutex<Vec<String>>>,
    refunded_payments: Arc<Mutex<Vec<String>>>,
    transcript_requests: Arc<Mutex<Vec<u64>>>,
    contact_syncs: Arc<Mutex<u32>>,
    online: bool,
}

impl RecordingAgentClient {
    /// Create a mock that reports the bot as online.
    pub fn new() -> Self {
        Self::with_online(true)
    }

    /// Create a mock with an explicit `check_online` answer.
    pub fn with_online(online: bool) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            accepted_payments: Arc::new(Mutex::new(Vec::new())),
            refunded_payments: Arc::new(Mutex::new(Vec::new())),
            transcript_requests: Arc::new(Mutex::new(Vec::new())),
            contact_syncs: Arc::new(Mutex::new(0)),
            online,
        }
    }

    /// All text messages captured so far.
    pub async fn sent_texts(&self) -> Vec<SentText> {
        self.sent.lock().await.clone()
    }

    /// Count of captured text messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Transfer ids passed to `accept_payment`.
    pub async fn accepted_payments(&self) -> Vec<String> {
        self.accepted_payments.lock().await.clone()
    }

    /// Transfer ids passed to `refund_payment`.
    pub async fn refunded_payments(&self) -> Vec<String> {
        self.refunded_payments.lock().await.clone()
    }

    /// Message ids passed to `request_voice_transcript`.
    pub async fn transcript_requests(&self) -> Vec<u64> {
        self.transcript_requests.lock().await.clone()
    }

    /// How many times `sync_contacts` was invoked.
    pub async fn contact_sync_count(&self) -> u32 {
        *self.contact_syncs.lock().await
    }
}

impl Default for RecordingAgentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentClient for RecordingAgentClient {
    async fn send_text(
        &self,
        _bot: &BotIdentity,
        target: &str,
        content: &str,
    ) -> Result<(), FerrybotError> {
        self.sent.lock().await.push(SentText {
            target: target.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn accept_payment(
        &self,
        _bot: &BotIdentity,
        transfer_id: &str,
    ) -> Result<(), FerrybotError> {
        self.accepted_payments
            .lock()
            .await
            .push(transfer_id.to_string());
        Ok(())
    }

    async fn refund_payment(
        &self,
        _bot: &BotIdentity,
        transfer_id: &str,
    ) -> Result<(), FerrybotError> {
        self.refunded_payments
            .lock()
            .await
            .push(transfer_id.to_string());
        Ok(())
    }

    async fn request_voice_transcript(
        &self,
        _bot: &BotIdentity,
        msgid: u64,
    ) -> Result<(), FerrybotError> {
        self.transcript_requests.lock().await.push(msgid);
        Ok(())
    }

    async fn sync_contacts(&self, _bot: &BotIdentity) -> Result<(), FerrybotError> {
        *self.contact_syncs.lock().await += 1;
        Ok(())
    }

    async fn check_online(&self, _bot: &BotIdentity) -> Result<bool, FerrybotError> {
        Ok(self.online)
    }
}
