// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Check-in engine: idempotent daily recording plus rank, streak, and
//! missed-day analytics, all timezone-aware and scoped to one room.

pub mod analytics;
pub mod handler;

use chrono::{DateTime, FixedOffset, Utc};
use ferrybot_core::FerrybotError;
use ferrybot_settings::SettingsService;
use ferrybot_storage::queries::checkins as q;
use ferrybot_storage::{CheckInRecord, Database};

pub use handler::CheckInHandler;

/// Result of recording a check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// First check-in of the room-local day.
    First {
        record: CheckInRecord,
        /// 1-based ordinal by arrival instant within the room's day.
        rank: i64,
        /// Consecutive local days ending today.
        streak: u32,
        /// Lifetime count in this room.
        total: i64,
    },
    /// The user already checked in this room-local day.
    Repeat { record: CheckInRecord },
}

/// Personal stats for one user in one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInStats {
    pub total: i64,
    pub streak: u32,
    pub missed: analytics::MissedDays,
}

/// Storage- and settings-backed check-in service.
#[derive(Clone)]
pub struct CheckInService {
    db: Database,
    settings: SettingsService,
}

impl CheckInService {
    pub fn new(db: Database, settings: SettingsService) -> Self {
        Self { db, settings }
    }

    /// The room-local calendar day for an instant, per the room's offset.
    async fn local_day(
        &self,
        bot_id: i64,
        room: &str,
        now: DateTime<Utc>,
    ) -> Result<String, FerrybotError> {
        let offset_hours = self.settings.room_utc_offset(bot_id, room).await?;
        let offset = FixedOffset::east_opt(offset_hours * 3600).ok_or_else(|| {
            FerrybotError::Internal(format!("invalid stored utc offset {offset_hours}"))
        })?;
        Ok(now.with_timezone(&offset).format("%Y-%m-%d").to_string())
    }

    /// Record a check-in for (room, user) at `now`.
    ///
    /// Storage enforces one record per room-local day; a lost race against
    /// a concurrent request comes back as [`CheckInOutcome::Repeat`] with
    /// the surviving row.
    pub async fn record(
        &self,
        bot_id: i64,
        room: &str,
        user: &str,
        keyword: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckInOutcome, FerrybotError> {
        let local_day = self.local_day(bot_id, room, now).await?;
        let occurred_at = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let (record, created) =
            q::insert_if_absent(&self.db, bot_id, room, user, keyword, &occurred_at, &local_day)
                .await?;

        if !created {
            return Ok(CheckInOutcome::Repeat { record });
        }

        let rank = q::rank_for(&self.db, bot_id, room, &local_day, &record.occurred_at_utc)
            .await?;
        let days = analytics::parse_days(&q::days_for_user(&self.db, bot_id, room, user).await?);
        let today = chrono::NaiveDate::parse_from_str(&local_day, "%Y-%m-%d")
            .map_err(|e| FerrybotError::Internal(format!("bad local day: {e}")))?;
        let streak = analytics::current_streak(&days, today);
        let total = q::total_for_user(&self.db, bot_id, room, user).await?;

        Ok(CheckInOutcome::First {
            record,
            rank,
            streak,
            total,
        })
    }

    /// Personal stats for (room, user) as of `now`.
    pub async fn stats(
        &self,
        bot_id: i64,
        room: &str,
        user: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckInStats, FerrybotError> {
        let local_day = self.local_day(bot_id, room, now).await?;
        let today = chrono::NaiveDate::parse_from_str(&local_day, "%Y-%m-%d")
            .map_err(|e| FerrybotError::Internal(format!("bad local day: {e}")))?;
        let days = analytics::parse_days(&q::days_for_user(&self.db, bot_id, room, user).await?);
        Ok(CheckInStats {
            total: q::total_for_user(&self.db, bot_id, room, user).await?,
            streak: analytics::current_streak(&days, today),
            missed: analytics::missed_days(&days),
        })
    }
}
