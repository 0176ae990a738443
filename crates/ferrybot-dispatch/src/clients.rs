// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Production HTTP implementations of the outbound collaborator traits.
//!
//! [`HttpAgentClient`] drives the IM-automation agent's command API;
//! [`HttpDeskSync`] mirrors conversations into the support desk. Both carry
//! a per-call timeout and translate transport failures into
//! [`FerrybotError`] for the caller to log.

use std::time::Duration;

use async_trait::async_trait;
use ferrybot_core::traits::{AgentClient, DeskContact, DeskMessage, DeskSync};
use ferrybot_core::{BotIdentity, FerrybotError};
use serde::Deserialize;
use serde_json::json;

/// Agent command kinds, mirroring the inbound `MT_*` vocabulary.
mod command {
    pub const SEND_TEXT: &str = "MT_SEND_TEXT_MSG";
    pub const ACCEPT_TRANSFER: &str = "MT_ACCEPT_TRANSFER_MSG";
    pub const REFUND_TRANSFER: &str = "MT_REFUND_TRANSFER_MSG";
    pub const TRANS_VOICE: &str = "MT_TRANS_VOICE_MSG";
    pub const SYNC_CONTACTS: &str = "MT_DATA_FRIENDS_MSG";
    pub const CHECK_ONLINE: &str = "MT_CHECK_ONLINE_MSG";
}

fn transport_err(what: &str, e: reqwest::Error, timeout: Duration) -> FerrybotError {
    if e.is_timeout() {
        FerrybotError::Timeout { duration: timeout }
    } else {
        FerrybotError::Agent {
            message: format!("{what} failed"),
            source: Some(Box::new(e)),
        }
    }
}

/// HTTP client for the agent's command endpoint.
///
/// Every command is `POST {base_url}/command` with the envelope
/// `{type, bot_wxid, data}`; the agent answers 200 with an optional JSON
/// body.
pub struct HttpAgentClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct OnlineResponse {
    #[serde(default)]
    online: bool,
}

impl HttpAgentClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, FerrybotError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FerrybotError::Agent {
                message: "agent client construction failed".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    async fn command(
        &self,
        bot: &BotIdentity,
        kind: &str,
        data: serde_json::Value,
    ) -> Result<reqwest::Response, FerrybotError> {
        let response = self
            .client
            .post(format!("{}/command", self.base_url))
            .timeout(self.timeout)
            .json(&json!({
                "type": kind,
                "bot_wxid": bot.wxid,
                "data": data,
            }))
            .send()
            .await
            .map_err(|e| transport_err(kind, e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FerrybotError::Agent {
                message: format!("{kind} returned {status}"),
                source: None,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn send_text(
        &self,
        bot: &BotIdentity,
        target: &str,
        content: &str,
    ) -> Result<(), FerrybotError> {
        self.command(
            bot,
            command::SEND_TEXT,
            json!({"to_wxid": target, "content": content}),
        )
        .await?;
        Ok(())
    }

    async fn accept_payment(
        &self,
        bot: &BotIdentity,
        transfer_id: &str,
    ) -> Result<(), FerrybotError> {
        self.command(
            bot,
            command::ACCEPT_TRANSFER,
            json!({"transferid": transfer_id}),
        )
        .await?;
        Ok(())
    }

    async fn refund_payment(
        &self,
        bot: &BotIdentity,
        transfer_id: &str,
    ) -> Result<(), FerrybotError> {
        self.command(
            bot,
            command::REFUND_TRANSFER,
            json!({"transferid": transfer_id}),
        )
        .await?;
        Ok(())
    }

    async fn request_voice_transcript(
        &self,
        bot: &BotIdentity,
        msgid: u64,
    ) -> Result<(), FerrybotError> {
        self.command(bot, command::TRANS_VOICE, json!({"msgid": msgid}))
            .await?;
        Ok(())
    }

    async fn sync_contacts(&self, bot: &BotIdentity) -> Result<(), FerrybotError> {
        self.command(bot, command::SYNC_CONTACTS, json!({})).await?;
        Ok(())
    }

    async fn check_online(&self, bot: &BotIdentity) -> Result<bool, FerrybotError> {
        let response = self.command(bot, command::CHECK_ONLINE, json!({})).await?;
        let body: OnlineResponse = response.json().await.unwrap_or_default();
        Ok(body.online)
    }
}

/// HTTP client for the support-desk API.
pub struct HttpDeskSync {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    timeout: Duration,
}

impl HttpDeskSync {
    pub fn new(
        base_url: String,
        api_token: String,
        timeout: Duration,
    ) -> Result<Self, FerrybotError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FerrybotError::Delivery {
                message: "desk client construction failed".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            timeout,
        })
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<(), FerrybotError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .timeout(self.timeout)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_err(path, e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FerrybotError::Delivery {
                message: format!("desk POST {path} returned {status}"),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DeskSync for HttpDeskSync {
    async fn ensure_contact(
        &self,
        bot: &BotIdentity,
        contact: &DeskContact,
    ) -> Result<(), FerrybotError> {
        // The desk upserts by (bot, wxid), so repeat calls are harmless.
        self.post(
            "/api/contacts",
            json!({
                "bot_wxid": bot.wxid,
                "wxid": contact.wxid,
                "name": contact.name,
                "avatar": contact.avatar,
                "is_room": contact.is_room,
            }),
        )
        .await
    }

    async fn sync_message(
        &self,
        bot: &BotIdentity,
        message: &DeskMessage,
    ) -> Result<(), FerrybotError> {
        self.post(
            "/api/messages",
            json!({
                "bot_wxid": bot.wxid,
                "sender": message.sender,
                "room_wxid": message.room_id,
                "content": message.content,
                "outgoing": message.outgoing,
            }),
        )
        .await
    }
}
