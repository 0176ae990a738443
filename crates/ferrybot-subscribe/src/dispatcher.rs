// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-minute subscription dispatch worker.
//!
//! Once a minute, every live subscription whose (minute, hour) matches the
//! current bot-local wall clock gets its keyword resource sent to the
//! subscriber. A subscription whose keyword has no resource is logged and
//! skipped; delivery failures are logged and never stop the tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use ferrybot_core::traits::AgentClient;
use ferrybot_core::FerrybotError;
use ferrybot_storage::queries::{bots, resources, subscriptions};
use ferrybot_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Background worker dispatching due subscriptions.
pub struct SubscriptionDispatcher {
    db: Database,
    agent: Arc<dyn AgentClient>,
    /// Whole-hour offset applied to the wall clock before matching.
    utc_offset_hours: i32,
}

impl SubscriptionDispatcher {
    pub fn new(db: Database, agent: Arc<dyn AgentClient>, utc_offset_hours: i32) -> Self {
        Self {
            db,
            agent,
            utc_offset_hours,
        }
    }

    /// Run until the token is cancelled, ticking once a minute.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("subscription dispatcher shutting down");
                    return;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        warn!(error = %e, "subscription tick failed");
                    }
                }
            }
        }
    }

    /// Dispatch everything due at the local time of `now`.
    ///
    /// Returns the number of deliveries attempted.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<u32, FerrybotError> {
        let offset = FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            FerrybotError::Internal(format!("invalid utc offset {}", self.utc_offset_hours))
        })?;
        let local = now.with_timezone(&offset);
        self.dispatch_at(local.minute() as u8, local.hour() as u8)
            .await
    }

    /// Dispatch everything scheduled for exactly (minute, hour).
    pub async fn dispatch_at(&self, minute: u8, hour: u8) -> Result<u32, FerrybotError> {
        let due = subscriptions::due_at(&self.db, minute, hour).await?;
        if due.is_empty() {
            return Ok(0);
        }
        debug!(minute, hour, count = due.len(), "dispatching due subscriptions");

        let mut attempted = 0;
        for sub in due {
            let Some(bot) = bots::by_id(&self.db, sub.bot_id).await? else {
                warn!(bot_id = sub.bot_id, "subscription points at a missing bot");
                continue;
            };
            let Some(resource) =
                resources::find_by_keyword(&self.db, sub.bot_id, &sub.keyword).await?
            else {
                debug!(keyword = %sub.keyword, "no resource for subscribed keyword");
                continue;
            };
            attempted += 1;
            if let Err(e) = self
                .agent
                .send_text(&bot.identity(), &sub.subscriber_wxid, &resource.render())
                .await
            {
                warn!(
                    subscriber = %sub.subscriber_wxid,
                    keyword = %sub.keyword,
                    error = %e,
                    "subscription delivery failed"
                );
            }
        }
        Ok(attempted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrybot_test_utils::{RecordingAgentClient, TestHarness};

    async fn dispatcher_with(
        h: &TestHarness,
    ) -> (SubscriptionDispatcher, Arc<RecordingAgentClient>) {
        let agent = Arc::new(RecordingAgentClient::new());
        (
            SubscriptionDispatcher::new(
                h.db.clone(),
                Arc::clone(&agent) as Arc<dyn AgentClient>,
                8,
            ),
            agent,
        )
    }

    #[tokio::test]
    async fn dispatches_due_subscription() {
        let h = TestHarness::new().await.unwrap();
        resources::insert(&h.db, None, "news", "Daily News", "https://news.example", "")
            .await
            .unwrap();
        subscriptions::insert(&h.db, h.bot.id, "u1", "news", 30, 8)
            .await
            .unwrap();
        let (dispatcher, agent) = dispatcher_with(&h).await;

        assert_eq!(dispatcher.dispatch_at(30, 8).await.unwrap(), 1);
        let sent = agent.sent_texts().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].target, "u1");
        assert!(sent[0].content.contains("Daily News"));
        assert!(sent[0].content.contains("https://news.example"));
    }

    #[tokio::test]
    async fn off_schedule_minute_dispatches_nothing() {
        let h = TestHarness::new().await.unwrap();
        resources::insert(&h.db, None, "news", "Daily News", "", "")
            .await
            .unwrap();
        subscriptions::insert(&h.db, h.bot.id, "u1", "news", 30, 8)
            .await
            .unwrap();
        let (dispatcher, agent) = dispatcher_with(&h).await;

        assert_eq!(dispatcher.dispatch_at(31, 8).await.unwrap(), 0);
        assert_eq!(agent.sent_count().await, 0);
    }

    #[tokio::test]
    async fn missing_resource_is_skipped() {
        let h = TestHarness::new().await.unwrap();
        subscriptions::insert(&h.db, h.bot.id, "u1", "orphan", 30, 8)
            .await
            .unwrap();
        let (dispatcher, agent) = dispatcher_with(&h).await;

        assert_eq!(dispatcher.dispatch_at(30, 8).await.unwrap(), 0);
        assert_eq!(agent.sent_count().await, 0);
    }

    #[tokio::test]
    async fn tick_applies_local_offset() {
        let h = TestHarness::new().await.unwrap();
        resources::insert(&h.db, None, "news", "Daily News", "", "")
            .await
            .unwrap();
        // 08:30 local at +8 is 00:30 UTC.
        subscriptions::insert(&h.db, h.bot.id, "u1", "news", 30, 8)
            .await
            .unwrap();
        let (dispatcher, agent) = dispatcher_with(&h).await;

        let now = DateTime::parse_from_rfc3339("2026-08-30T00:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(dispatcher.tick(now).await.unwrap(), 1);
        assert_eq!(agent.sent_count().await, 1);
    }
}
