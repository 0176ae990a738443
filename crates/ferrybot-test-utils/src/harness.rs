// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temp-database test harness.
//!
//! `TestHarness` opens a migrated SQLite database in a temp directory and
//! provisions one bot, which covers the setup boilerplate of most service
//! and handler tests. Helpers build inbound envelopes and contexts for
//! driving pipeline handlers directly.

use ferrybot_core::{AgentEvent, BotIdentity, EventContext, FerrybotError};
use ferrybot_settings::SettingsService;
use ferrybot_storage::queries::bots;
use ferrybot_storage::{BotRecord, Database};

/// A migrated temp database with one provisioned bot.
///
/// The temp directory lives as long as the harness; dropping the harness
/// deletes the database.
pub struct TestHarness {
    pub db: Database,
    pub bot: BotRecord,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Open a fresh database and create a bot with fixed test identifiers.
    pub async fn new() -> Result<Self, FerrybotError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| FerrybotError::Internal(format!("temp dir: {e}")))?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path.to_string_lossy()).await?;
        let bot = bots::create(&db, "bot_self_wxid", "ferry", "test-token").await?;
        Ok(Self {
            db,
            bot,
            _temp_dir: temp_dir,
        })
    }

    /// A settings service over the harness database.
    pub fn settings(&self) -> SettingsService {
        SettingsService::new(self.db.clone())
    }

    /// The harness bot as a pipeline identity.
    pub fn identity(&self) -> BotIdentity {
        self.bot.identity()
    }

    /// An inbound text envelope from `from` in `room` (empty for direct).
    pub fn text_event(&self, from: &str, room: &str, msg: &str) -> AgentEvent {
        AgentEvent {
            kind: "MT_RECV_TEXT_MSG".into(),
            client_id: 1,
            data: serde_json::json!({
                "from_wxid": from,
                "to_wxid": self.bot.wxid,
                "room_wxid": room,
                "msgid": 1001u64,
                "msg": msg,
            }),
        }
    }

    /// A ready-to-run context for an inbound text message.
    pub fn text_context(&self, from: &str, room: &str, msg: &str) -> EventContext {
        EventContext::new(self.text_event(from, room, msg), self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_provisions_bot() {
        let h = TestHarness::new().await.unwrap();
        assert_eq!(h.bot.wxid, "bot_self_wxid");

        let ctx = h.text_context("user_1", "room_1", "hello");
        assert!(ctx.is_room_message());
        assert_eq!(ctx.text(), "hello");
        assert!(!ctx.is_from_bot_self);

        let own = h.text_context("bot_self_wxid", "", "whoami");
        assert!(own.is_from_bot_self);
    }
}
