// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline handler turning check-in keywords into recorded check-ins.
//!
//! Runs in the Message stage. Only trimmed exact-match keywords in rooms
//! qualify; everything else falls through to the next handler. The
//! permission cascade (room messaging AND check-in) gates the whole
//! handler, and a disabled room behaves as if the handler were absent.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ferrybot_core::traits::AgentClient;
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use ferrybot_settings::SettingsService;
use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::{CheckInOutcome, CheckInService};

/// Trimmed message bodies that record a check-in.
const CHECK_IN_KEYWORDS: &[&str] = &["打卡", "checkin", "check-in"];

/// Trimmed message bodies that reply with personal stats.
const STATS_KEYWORDS: &[&str] = &["打卡统计", "checkin stats"];

const ENCOURAGEMENTS: &[&str] = &[
    "Keep the momentum going!",
    "Consistency beats intensity.",
    "Another day in the books.",
    "Showing up is half the battle.",
    "See you again tomorrow!",
];

/// Message-stage handler for check-in and check-in-stats keywords.
pub struct CheckInHandler {
    service: CheckInService,
    settings: SettingsService,
    agent: Arc<dyn AgentClient>,
}

impl CheckInHandler {
    pub fn new(
        service: CheckInService,
        settings: SettingsService,
        agent: Arc<dyn AgentClient>,
    ) -> Self {
        Self {
            service,
            settings,
            agent,
        }
    }

    fn compose_reply(user: &str, outcome: &CheckInOutcome) -> String {
        match outcome {
            CheckInOutcome::First {
                rank,
                streak,
                total,
                ..
            } => {
                let mut rng = rand::thread_rng();
                // Non-empty const slice, choose cannot return None.
                let line = ENCOURAGEMENTS
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(ENCOURAGEMENTS[0]);
                format!(
                    "@{user} checked in! #{rank} today, {streak} day streak, {total} total. {line}"
                )
            }
            CheckInOutcome::Repeat { .. } => {
                format!("@{user} already checked in today.")
            }
        }
    }

    async fn reply(&self, ctx: &mut EventContext, body: &str) -> Result<(), FerrybotError> {
        self.agent
            .send_text(&ctx.bot, ctx.reply_target(), body)
            .await?;
        ctx.replied = true;
        Ok(())
    }

    async fn handle_stats(&self, ctx: &mut EventContext) -> Result<(), FerrybotError> {
        let stats = self
            .service
            .stats(ctx.bot.id, &ctx.room_id, &ctx.sender, Utc::now())
            .await?;
        let body = format!(
            "@{} check-in stats: {} total, {} day streak, {} missed days ({}% of span).",
            ctx.sender, stats.total, stats.streak, stats.missed.count, stats.missed.percent
        );
        self.reply(ctx, &body).await
    }

    async fn handle_check_in(
        &self,
        ctx: &mut EventContext,
        keyword: &str,
    ) -> Result<(), FerrybotError> {
        let outcome = self
            .service
            .record(ctx.bot.id, &ctx.room_id, &ctx.sender, keyword, Utc::now())
            .await?;
        if let CheckInOutcome::First { rank, streak, .. } = &outcome {
            info!(
                room = %ctx.room_id,
                user = %ctx.sender,
                rank,
                streak,
                "check-in recorded"
            );
        }
        let body = Self::compose_reply(&ctx.sender, &outcome);
        self.reply(ctx, &body).await
    }
}

#[async_trait]
impl Handler for CheckInHandler {
    fn name(&self) -> &'static str {
        "check_in"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.is_claimed()
            || ctx.message_kind != EventKind::TextReceived
            || !ctx.is_room_message()
            || ctx.is_from_bot_self
        {
            return next.run(ctx).await;
        }

        let text = ctx.text().trim().to_string();
        let is_stats = STATS_KEYWORDS.contains(&text.as_str());
        let is_check_in = CHECK_IN_KEYWORDS.contains(&text.as_str());
        if !is_stats && !is_check_in {
            return next.run(ctx).await;
        }

        if !self
            .settings
            .check_in_permitted(ctx.bot.id, &ctx.room_id)
            .await?
        {
            warn!(room = %ctx.room_id, "check-in keyword in a room without permission");
            return next.run(ctx).await;
        }

        if is_stats {
            self.handle_stats(ctx).await?;
        } else {
            self.handle_check_in(ctx, &text).await?;
        }
        ctx.claim(self.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrybot_core::Stage;
    use ferrybot_settings::{Scope, SettingKey};
    use ferrybot_test_utils::{RecordingAgentClient, TestHarness};

    fn stage_with(h: &TestHarness) -> (Stage, Arc<RecordingAgentClient>) {
        let agent = Arc::new(RecordingAgentClient::new());
        let settings = h.settings();
        let service = CheckInService::new(h.db.clone(), settings.clone());
        let handler = CheckInHandler::new(
            service,
            settings,
            Arc::clone(&agent) as Arc<dyn AgentClient>,
        );
        (Stage::new("message").handler(Arc::new(handler)), agent)
    }

    async fn permit_room(h: &TestHarness, room: &str) {
        h.settings()
            .set(
                h.bot.id,
                SettingKey::RoomMessages,
                Scope::Room(room.into()),
                None,
                true,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn keyword_records_and_claims() {
        let h = TestHarness::new().await.unwrap();
        permit_room(&h, "room_a").await;
        let (stage, agent) = stage_with(&h);

        let mut ctx = h.text_context("user_1", "room_a", " 打卡 ");
        stage.run(&mut ctx).await.unwrap();

        assert_eq!(ctx.processed_by, vec!["check_in"]);
        assert!(ctx.replied);
        let sent = agent.sent_texts().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].target, "room_a");
        assert!(sent[0].content.contains("#1 today"));
    }

    #[tokio::test]
    async fn repeat_gets_acknowledgment() {
        let h = TestHarness::new().await.unwrap();
        permit_room(&h, "room_a").await;
        let (stage, agent) = stage_with(&h);

        let mut first = h.text_context("user_1", "room_a", "checkin");
        stage.run(&mut first).await.unwrap();
        let mut second = h.text_context("user_1", "room_a", "checkin");
        stage.run(&mut second).await.unwrap();

        let sent = agent.sent_texts().await;
        assert_eq!(sent.len(), 2);
        assert!(sent[1].content.contains("already checked in"));
        // The repeat still claims the event; it was handled.
        assert!(second.is_claimed());
    }

    #[tokio::test]
    async fn non_keyword_falls_through() {
        let h = TestHarness::new().await.unwrap();
        permit_room(&h, "room_a").await;
        let (stage, agent) = stage_with(&h);

        let mut ctx = h.text_context("user_1", "room_a", "hello there");
        stage.run(&mut ctx).await.unwrap();

        assert!(!ctx.is_claimed());
        assert_eq!(agent.sent_count().await, 0);
    }

    #[tokio::test]
    async fn unpermitted_room_falls_through() {
        let h = TestHarness::new().await.unwrap();
        let (stage, agent) = stage_with(&h);

        // room_messages defaults to false: the permission cascade blocks.
        let mut ctx = h.text_context("user_1", "room_a", "打卡");
        stage.run(&mut ctx).await.unwrap();

        assert!(!ctx.is_claimed());
        assert_eq!(agent.sent_count().await, 0);
    }

    #[tokio::test]
    async fn direct_message_is_ignored() {
        let h = TestHarness::new().await.unwrap();
        let (stage, agent) = stage_with(&h);

        let mut ctx = h.text_context("user_1", "", "打卡");
        stage.run(&mut ctx).await.unwrap();

        assert!(!ctx.is_claimed());
        assert_eq!(agent.sent_count().await, 0);
    }

    #[tokio::test]
    async fn stats_keyword_reports_totals() {
        let h = TestHarness::new().await.unwrap();
        permit_room(&h, "room_a").await;
        let (stage, agent) = stage_with(&h);

        let mut checkin = h.text_context("user_1", "room_a", "checkin");
        stage.run(&mut checkin).await.unwrap();
        let mut stats = h.text_context("user_1", "room_a", "checkin stats");
        stage.run(&mut stats).await.unwrap();

        let sent = agent.sent_texts().await;
        assert_eq!(sent.len(), 2);
        assert!(sent[1].content.contains("1 total"));
        assert!(sent[1].content.contains("1 day streak"));
        assert!(stats.is_claimed());
    }
}
