// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword subscriptions: daily-only cron grammar, create-or-restore with
//! soft-delete semantics, and the per-minute dispatch worker.

pub mod cron;
pub mod dispatcher;
pub mod service;

pub use cron::{CronError, DailySchedule, parse_daily};
pub use dispatcher::SubscriptionDispatcher;
pub use service::{SubscribeOutcome, SubscribeService};
