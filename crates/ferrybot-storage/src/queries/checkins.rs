// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Check-in rows with storage-level daily uniqueness.
//!
//! The UNIQUE(bot, room, user, local_day) index is the authority on "one
//! check-in per day": [`insert_if_absent`] races cleanly under concurrent
//! requests because the losing insert is a no-op and both callers re-select
//! the surviving row.

use ferrybot_core::FerrybotError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::CheckInRecord;

fn row_to_check_in(row: &rusqlite::Row<'_>) -> Result<CheckInRecord, rusqlite::Error> {
    Ok(CheckInRecord {
        id: row.get(0)?,
        bot_id: row.get(1)?,
        room_wxid: row.get(2)?,
        user_wxid: row.get(3)?,
        keyword: row.get(4)?,
        occurred_at_utc: row.get(5)?,
        local_day: row.get(6)?,
    })
}

const CHECK_IN_COLUMNS: &str =
    "id, bot_id, room_wxid, user_wxid, keyword, occurred_at_utc, local_day";

/// Insert a check-in unless one already exists for the same room-local day.
///
/// Returns the surviving row and whether this call created it. A concurrent
/// duplicate is a lost update, never a constraint error.
pub async fn insert_if_absent(
    db: &Database,
    bot_id: i64,
    room_wxid: &str,
    user_wxid: &str,
    keyword: &str,
    occurred_at_utc: &str,
    local_day: &str,
) -> Result<(CheckInRecord, bool), FerrybotError> {
    let room_wxid = room_wxid.to_string();
    let user_wxid = user_wxid.to_string();
    let keyword = keyword.to_string();
    let occurred_at_utc = occurred_at_utc.to_string();
    let local_day = local_day.to_string();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO check_ins
                     (bot_id, room_wxid, user_wxid, keyword, occurred_at_utc, local_day)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (bot_id, room_wxid, user_wxid, local_day) DO NOTHING",
                params![bot_id, room_wxid, user_wxid, keyword, occurred_at_utc, local_day],
            )?;
            let record = conn.query_row(
                &format!(
                    "SELECT {CHECK_IN_COLUMNS} FROM check_ins
                     WHERE bot_id = ?1 AND room_wxid = ?2 AND user_wxid = ?3 AND local_day = ?4"
                ),
                params![bot_id, room_wxid, user_wxid, local_day],
                row_to_check_in,
            )?;
            Ok((record, inserted > 0))
        })
        .await
        .map_err(map_tr_err)
}

/// Ordinal rank of a check-in among its room's records for the day.
///
/// Rank 1 is the earliest `occurred_at_utc`; scoped to one room only.
pub async fn rank_for(
    db: &Database,
    bot_id: i64,
    room_wxid: &str,
    local_day: &str,
    occurred_at_utc: &str,
) -> Result<i64, FerrybotError> {
    let room_wxid = room_wxid.to_string();
    let local_day = local_day.to_string();
    let occurred_at_utc = occurred_at_utc.to_string();
    db.connection()
        .call(move |conn| {
            let rank = conn.query_row(
                "SELECT COUNT(*) FROM check_ins
                 WHERE bot_id = ?1 AND room_wxid = ?2 AND local_day = ?3
                   AND occurred_at_utc <= ?4",
                params![bot_id, room_wxid, local_day, occurred_at_utc],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(rank)
        })
        .await
        .map_err(map_tr_err)
}

/// The user's distinct check-in days in one room, most recent first.
pub async fn days_for_user(
    db: &Database,
    bot_id: i64,
    room_wxid: &str,
    user_wxid: &str,
) -> Result<Vec<String>, FerrybotError> {
    let room_wxid = room_wxid.to_string();
    let user_wxid = user_wxid.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT local_day FROM check_ins
                 WHERE bot_id = ?1 AND room_wxid = ?2 AND user_wxid = ?3
                 ORDER BY local_day DESC",
            )?;
            let days = stmt
                .query_map(params![bot_id, room_wxid, user_wxid], |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(days)
        })
        .await
        .map_err(map_tr_err)
}

/// Lifetime check-in count for a user in one room.
pub async fn total_for_user(
    db: &Database,
    bot_id: i64,
    room_wxid: &str,
    user_wxid: &str,
) -> Result<i64, FerrybotError> {
    let room_wxid = room_wxid.to_string();
    let user_wxid = user_wxid.to_string();
    db.connection()
        .call(move |conn| {
            let total = conn.query_row(
                "SELECT COUNT(*) FROM check_ins
                 WHERE bot_id = ?1 AND room_wxid = ?2 AND user_wxid = ?3",
                params![bot_id, room_wxid, user_wxid],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(total)
        })
        .await
        .map_err(map_tr_err)
}
