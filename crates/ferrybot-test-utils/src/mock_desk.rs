// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock desk-sync target that captures mirrored contacts and messages.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ferrybot_core::traits::{DeskContact, DeskMessage, DeskSync};
use ferrybot_core::{BotIdentity, FerrybotError};

/// A desk-sync mock that records everything mirrored to it.
pub struct RecordingDeskSync {
    contacts: Arc<Mutex<Vec<DeskContact>>>,
    messages: Arc<Mutex<Vec<DeskMessage>>>,
}

impl RecordingDeskSync {
    pub fn new() -> Self {
        Self {
            contacts: Arc::new(Mutex::new(Vec::new())),
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Contacts passed to `ensure_contact`, in call order.
    pub async fn contacts(&self) -> Vec<DeskContact> {
        self.contacts.lock().await.clone()
    }

    /// Messages passed to `sync_message`, in call order.
    pub async fn messages(&self) -> Vec<DeskMessage> {
        self.messages.lock().await.clone()
    }
}

impl Default for RecordingDeskSync {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeskSync for RecordingDeskSync {
    async fn ensure_contact(
        &self,
        _bot: &BotIdentity,
        contact: &DeskContact,
    ) -> Result<(), FerrybotError> {
        self.contacts.lock().await.push(contact.clone());
        Ok(())
    }

    async fn sync_message(
        &self,
        _bot: &BotIdentity,
        message: &DeskMessage,
    ) -> Result<(), FerrybotError> {
        self.messages.lock().await.push(message.clone());
        Ok(())
    }
}
