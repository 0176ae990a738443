// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription lifecycle: create-or-restore, cancel, list.

use ferrybot_core::FerrybotError;
use ferrybot_storage::queries::subscriptions as q;
use ferrybot_storage::{Database, SubscriptionRecord};
use tracing::info;

use crate::cron::DailySchedule;

/// Result of a subscribe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOutcome {
    pub record: SubscriptionRecord,
    /// False when an existing row was restored or was already live.
    pub created: bool,
}

/// Storage-backed subscription service.
#[derive(Clone)]
pub struct SubscribeService {
    db: Database,
}

impl SubscribeService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Subscribe `subscriber` to `keyword`.
    ///
    /// A soft-deleted row for the same (subscriber, keyword) is restored in
    /// place and keeps its original schedule; the new schedule argument is
    /// discarded. An already-live row is returned as-is. Only a genuinely
    /// new subscription uses `schedule`.
    pub async fn create_or_restore(
        &self,
        bot_id: i64,
        subscriber: &str,
        keyword: &str,
        schedule: DailySchedule,
    ) -> Result<SubscribeOutcome, FerrybotError> {
        if let Some(existing) = q::find_including_deleted(&self.db, bot_id, subscriber, keyword)
            .await?
        {
            if existing.is_deleted() {
                let record = q::restore(&self.db, existing.id).await?;
                info!(
                    subscriber,
                    keyword,
                    cron = %record.cron_expression(),
                    "subscription restored with original schedule"
                );
                return Ok(SubscribeOutcome {
                    record,
                    created: false,
                });
            }
            return Ok(SubscribeOutcome {
                record: existing,
                created: false,
            });
        }

        let record = q::insert(
            &self.db,
            bot_id,
            subscriber,
            keyword,
            schedule.minute,
            schedule.hour,
        )
        .await?;
        info!(subscriber, keyword, cron = %record.cron_expression(), "subscription created");
        Ok(SubscribeOutcome {
            record,
            created: true,
        })
    }

    /// Cancel by exact (subscriber, keyword) match.
    ///
    /// Returns whether a live subscription existed; `false` carries no side
    /// effects at all.
    pub async fn cancel(
        &self,
        bot_id: i64,
        subscriber: &str,
        keyword: &str,
    ) -> Result<bool, FerrybotError> {
        let cancelled = q::soft_delete(&self.db, bot_id, subscriber, keyword).await?;
        if cancelled {
            info!(subscriber, keyword, "subscription cancelled");
        }
        Ok(cancelled)
    }

    /// Live subscriptions for one subscriber, ordered by keyword.
    pub async fn list(
        &self,
        bot_id: i64,
        subscriber: &str,
    ) -> Result<Vec<SubscriptionRecord>, FerrybotError> {
        q::list_for_subscriber(&self.db, bot_id, subscriber).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cron::parse_daily;
    use ferrybot_test_utils::TestHarness;

    #[tokio::test]
    async fn restore_keeps_original_schedule() {
        let h = TestHarness::new().await.unwrap();
        let svc = SubscribeService::new(h.db.clone());
        let cron_a = parse_daily("30 8 * * *").unwrap();
        let cron_b = parse_daily("0 20 * * *").unwrap();

        let created = svc
            .create_or_restore(h.bot.id, "u1", "news", cron_a)
            .await
            .unwrap();
        assert!(created.created);

        assert!(svc.cancel(h.bot.id, "u1", "news").await.unwrap());

        let restored = svc
            .create_or_restore(h.bot.id, "u1", "news", cron_b)
            .await
            .unwrap();
        assert!(!restored.created);
        assert_eq!(restored.record.id, created.record.id);
        // The new cron argument is discarded on restore.
        assert_eq!(restored.record.cron_expression(), "30 8 * * *");
        assert!(!restored.record.is_deleted());
    }

    #[tokio::test]
    async fn duplicate_subscribe_is_idempotent() {
        let h = TestHarness::new().await.unwrap();
        let svc = SubscribeService::new(h.db.clone());
        let cron = parse_daily("30 8 * * *").unwrap();

        let first = svc
            .create_or_restore(h.bot.id, "u1", "news", cron)
            .await
            .unwrap();
        let second = svc
            .create_or_restore(h.bot.id, "u1", "news", cron)
            .await
            .unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.record.id, second.record.id);
        assert_eq!(svc.list(h.bot.id, "u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancel_without_match_has_no_effect() {
        let h = TestHarness::new().await.unwrap();
        let svc = SubscribeService::new(h.db.clone());
        assert!(!svc.cancel(h.bot.id, "u1", "missing").await.unwrap());
        assert!(svc.list(h.bot.id, "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_scoped_to_subscriber() {
        let h = TestHarness::new().await.unwrap();
        let svc = SubscribeService::new(h.db.clone());
        let cron = parse_daily("30 8 * * *").unwrap();
        svc.create_or_restore(h.bot.id, "u1", "news", cron)
            .await
            .unwrap();
        svc.create_or_restore(h.bot.id, "u2", "news", cron)
            .await
            .unwrap();

        let subs = svc.list(h.bot.id, "u1").await.unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].subscriber_wxid, "u1");
    }
}
