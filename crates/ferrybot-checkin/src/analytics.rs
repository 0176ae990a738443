// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure streak and missed-day computations over check-in day lists.
//!
//! Days are `YYYY-MM-DD` strings in the room's local calendar, as stored;
//! lists arrive most recent first from the storage layer.

use chrono::{Days, NaiveDate};

/// Length of the streak ending today.
///
/// Counts consecutive local days backward from `today` through `days`
/// (sorted descending). A gap immediately before today means the streak is
/// whatever today's contiguous run is; older runs never count.
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut expected = today;
    let mut streak = 0;
    for day in days {
        if *day != expected {
            break;
        }
        streak += 1;
        match expected.checked_sub_days(Days::new(1)) {
            Some(prev) => expected = prev,
            None => break,
        }
    }
    streak
}

/// Missed-day stats over the span from first to latest check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissedDays {
    /// Days in the span with no check-in.
    pub count: u32,
    /// Missed days as a whole percentage of the span.
    pub percent: u32,
}

/// Count the days between the user's first and latest check-in that have no
/// record. Fewer than two distinct days means nothing can be missed.
pub fn missed_days(days: &[NaiveDate]) -> MissedDays {
    let (Some(latest), Some(first)) = (days.first(), days.last()) else {
        return MissedDays { count: 0, percent: 0 };
    };
    let span = (*latest - *first).num_days() + 1;
    if span <= 0 {
        return MissedDays { count: 0, percent: 0 };
    }
    let missed = span - days.len() as i64;
    let missed = missed.max(0) as u32;
    MissedDays {
        count: missed,
        percent: (u64::from(missed) * 100 / span as u64) as u32,
    }
}

/// Parse the stored `YYYY-MM-DD` strings, skipping anything malformed.
pub fn parse_days(days: &[String]) -> Vec<NaiveDate> {
    days.iter()
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn three_consecutive_days_is_streak_three() {
        let days = vec![d("2026-08-30"), d("2026-08-29"), d("2026-08-28")];
        assert_eq!(current_streak(&days, d("2026-08-30")), 3);
    }

    #[test]
    fn gap_resets_streak_to_current_run() {
        // Check-ins on D and D+2; today is D+2, D+1 missing.
        let days = vec![d("2026-08-30"), d("2026-08-28")];
        assert_eq!(current_streak(&days, d("2026-08-30")), 1);
    }

    #[test]
    fn no_check_in_today_means_zero() {
        let days = vec![d("2026-08-29"), d("2026-08-28")];
        assert_eq!(current_streak(&days, d("2026-08-30")), 0);
    }

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(current_streak(&[], d("2026-08-30")), 0);
    }

    #[test]
    fn missed_days_over_gappy_span() {
        // Span 2026-08-20..=2026-08-29 is 10 days; 4 recorded, 6 missed.
        let days = vec![
            d("2026-08-29"),
            d("2026-08-27"),
            d("2026-08-21"),
            d("2026-08-20"),
        ];
        let missed = missed_days(&days);
        assert_eq!(missed.count, 6);
        assert_eq!(missed.percent, 60);
    }

    #[test]
    fn dense_history_has_no_missed_days() {
        let days = vec![d("2026-08-30"), d("2026-08-29"), d("2026-08-28")];
        assert_eq!(missed_days(&days), MissedDays { count: 0, percent: 0 });
    }

    #[test]
    fn single_day_has_no_span() {
        assert_eq!(
            missed_days(&[d("2026-08-30")]),
            MissedDays { count: 0, percent: 0 }
        );
        assert_eq!(missed_days(&[]), MissedDays { count: 0, percent: 0 });
    }

    #[test]
    fn parse_skips_malformed_days() {
        let parsed = parse_days(&["2026-08-30".into(), "garbage".into()]);
        assert_eq!(parsed, vec![d("2026-08-30")]);
    }
}
