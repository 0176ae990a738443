// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.

use ferrybot_core::BotIdentity;
use serde::{Deserialize, Serialize};

/// A bot account the gateway serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotRecord {
    pub id: i64,
    /// The bot's own IM account id.
    pub wxid: String,
    pub name: String,
    /// Token identifying this bot in the inbound callback URL.
    pub callback_token: String,
    /// Per-bot webhook target; empty disables forwarding.
    pub webhook_url: String,
    /// HMAC secret; empty means deliveries go unsigned.
    pub webhook_secret: String,
    /// Support-desk inbox the bot mirrors conversations into.
    pub desk_inbox_id: i64,
    pub created_at: String,
}

impl BotRecord {
    /// The lightweight identity handed to the pipeline.
    pub fn identity(&self) -> BotIdentity {
        BotIdentity {
            id: self.id,
            wxid: self.wxid.clone(),
            name: self.name.clone(),
        }
    }
}

/// A contact known to a bot (user, room, or official account).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub id: i64,
    pub bot_id: i64,
    pub wxid: String,
    pub name: String,
    pub remark: String,
    pub avatar: String,
    pub is_room: bool,
}

/// One daily check-in. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInRecord {
    pub id: i64,
    pub bot_id: i64,
    pub room_wxid: String,
    pub user_wxid: String,
    pub keyword: String,
    /// The exact wall-clock instant, never truncated to midnight.
    pub occurred_at_utc: String,
    /// Calendar day in the room's timezone at insert time, `YYYY-MM-DD`.
    pub local_day: String,
}

/// A keyword subscription with soft-delete semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub id: i64,
    pub bot_id: i64,
    /// User or room id.
    pub subscriber_wxid: String,
    pub keyword: String,
    pub cron_minute: u8,
    pub cron_hour: u8,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

impl SubscriptionRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Canonical `"m h * * *"` rendering of the schedule.
    pub fn cron_expression(&self) -> String {
        format!("{} {} * * *", self.cron_minute, self.cron_hour)
    }
}

/// A keyword-triggered resource. `bot_id` of `None` means shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordResource {
    pub id: i64,
    pub bot_id: Option<i64>,
    pub keyword: String,
    pub title: String,
    pub url: String,
    pub content: String,
}

impl KeywordResource {
    /// Render the resource as an outbound text message.
    ///
    /// Title, content, and url are each optional; present parts are joined
    /// on their own lines in that order.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        if !self.title.is_empty() {
            lines.push(self.title.as_str());
        }
        if !self.content.is_empty() {
            lines.push(self.content.as_str());
        }
        if !self.url.is_empty() {
            lines.push(self.url.as_str());
        }
        lines.join("\n")
    }
}

/// A queued background job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEntry {
    pub id: i64,
    pub queue_name: String,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}
