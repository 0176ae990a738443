// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily-only cron grammar: `"minute hour * * *"`.
//!
//! The subscription engine schedules at most once per day, so the last
//! three fields must be literal `*`. Parse errors are user-visible; the
//! command layer echoes them back verbatim.

use thiserror::Error;

/// A parsed daily schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub minute: u8,
    pub hour: u8,
}

impl DailySchedule {
    pub fn expression(&self) -> String {
        format!("{} {} * * *", self.minute, self.hour)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("cron expression must have 5 fields, got {0}")]
    FieldCount(usize),
    #[error("minute must be a number in 0..=59, got \"{0}\"")]
    Minute(String),
    #[error("hour must be a number in 0..=23, got \"{0}\"")]
    Hour(String),
    #[error("only daily schedules are supported; fields 3-5 must be \"*\", got \"{0}\"")]
    NotDaily(String),
}

/// Parse a `"m h * * *"` expression.
pub fn parse_daily(expr: &str) -> Result<DailySchedule, CronError> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(CronError::FieldCount(fields.len()));
    }
    let minute: u8 = fields[0]
        .parse()
        .ok()
        .filter(|m| *m <= 59)
        .ok_or_else(|| CronError::Minute(fields[0].to_string()))?;
    let hour: u8 = fields[1]
        .parse()
        .ok()
        .filter(|h| *h <= 23)
        .ok_or_else(|| CronError::Hour(fields[1].to_string()))?;
    for field in &fields[2..] {
        if *field != "*" {
            return Err(CronError::NotDaily((*field).to_string()));
        }
    }
    Ok(DailySchedule { minute, hour })
}
