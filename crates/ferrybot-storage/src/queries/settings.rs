// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Global settings, per-room overrides, and room timezone rows.
//!
//! Overrides are stored one row per (bot, setting, room) so concurrent
//! writers to different settings or rooms never clobber each other; there
//! is no whole-map write anywhere in this module.

use ferrybot_core::FerrybotError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Global value for a setting, if one was ever written.
pub async fn global(
    db: &Database,
    bot_id: i64,
    setting: &str,
) -> Result<Option<bool>, FerrybotError> {
    let setting = setting.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT value FROM bot_settings WHERE bot_id = ?1 AND setting = ?2",
                params![bot_id, setting],
                |row| row.get::<_, bool>(0),
            );
            match result {
                Ok(v) => Ok(Some(v)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Upsert the global value for a setting.
pub async fn set_global(
    db: &Database,
    bot_id: i64,
    setting: &str,
    value: bool,
) -> Result<(), FerrybotError> {
    let setting = setting.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bot_settings (bot_id, setting, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT (bot_id, setting) DO UPDATE SET value = excluded.value",
                params![bot_id, setting, value],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Per-room override for a setting; `None` means inherit from global.
pub async fn room_override(
    db: &Database,
    bot_id: i64,
    setting: &str,
    room_wxid: &str,
) -> Result<Option<bool>, FerrybotError> {
    let setting = setting.to_string();
    let room_wxid = room_wxid.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT value FROM bot_room_overrides
                 WHERE bot_id = ?1 AND setting = ?2 AND room_wxid = ?3",
                params![bot_id, setting, room_wxid],
                |row| row.get::<_, bool>(0),
            );
            match result {
                Ok(v) => Ok(Some(v)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Upsert a single room override without touching any other row.
pub async fn set_room_override(
    db: &Database,
    bot_id: i64,
    setting: &str,
    room_wxid: &str,
    value: bool,
) -> Result<(), FerrybotError> {
    let setting = setting.to_string();
    let room_wxid = room_wxid.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bot_room_overrides (bot_id, setting, room_wxid, value)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (bot_id, setting, room_wxid) DO UPDATE SET value = excluded.value",
                params![bot_id, setting, room_wxid, value],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All overrides for one setting, for diagnostics output.
pub async fn overrides_for(
    db: &Database,
    bot_id: i64,
    setting: &str,
) -> Result<Vec<(String, bool)>, FerrybotError> {
    let setting = setting.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT room_wxid, value FROM bot_room_overrides
                 WHERE bot_id = ?1 AND setting = ?2 ORDER BY room_wxid",
            )?;
            let rows = stmt
                .query_map(params![bot_id, setting], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Configured UTC offset for a room, in whole hours.
pub async fn room_timezone(
    db: &Database,
    bot_id: i64,
    room_wxid: &str,
) -> Result<Option<i32>, FerrybotError> {
    let room_wxid = room_wxid.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT utc_offset_hours FROM room_timezones
                 WHERE bot_id = ?1 AND room_wxid = ?2",
                params![bot_id, room_wxid],
                |row| row.get::<_, i32>(0),
            );
            match result {
                Ok(v) => Ok(Some(v)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Upsert a room's UTC offset.
pub async fn set_room_timezone(
    db: &Database,
    bot_id: i64,
    room_wxid: &str,
    utc_offset_hours: i32,
) -> Result<(), FerrybotError> {
    let room_wxid = room_wxid.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO room_timezones (bot_id, room_wxid, utc_offset_hours)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (bot_id, room_wxid)
                 DO UPDATE SET utc_offset_hours = excluded.utc_offset_hours",
                params![bot_id, room_wxid, utc_offset_hours],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::bots;
    use tempfile::tempdir;

    async fn setup() -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let bot = bots::create(&db, "bot_w1", "ferry", "tok").await.unwrap();
        (db, bot.id, dir)
    }

    #[tokio::test]
    async fn global_absent_then_set() {
        let (db, bot_id, _dir) = setup().await;
        assert_eq!(global(&db, bot_id, "check_in").await.unwrap(), None);
        set_global(&db, bot_id, "check_in", true).await.unwrap();
        assert_eq!(global(&db, bot_id, "check_in").await.unwrap(), Some(true));
        // Upsert flips in place.
        set_global(&db, bot_id, "check_in", false).await.unwrap();
        assert_eq!(global(&db, bot_id, "check_in").await.unwrap(), Some(false));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn overrides_are_per_room_rows() {
        let (db, bot_id, _dir) = setup().await;
        set_room_override(&db, bot_id, "room_messages", "room_a", true)
            .await
            .unwrap();
        set_room_override(&db, bot_id, "room_messages", "room_b", false)
            .await
            .unwrap();
        // Writing room_b must not disturb room_a.
        assert_eq!(
            room_override(&db, bot_id, "room_messages", "room_a")
                .await
                .unwrap(),
            Some(true)
        );
        assert_eq!(
            room_override(&db, bot_id, "room_messages", "room_c")
                .await
                .unwrap(),
            None
        );
        let all = overrides_for(&db, bot_id, "room_messages").await.unwrap();
        assert_eq!(
            all,
            vec![("room_a".into(), true), ("room_b".into(), false)]
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn timezone_roundtrip() {
        let (db, bot_id, _dir) = setup().await;
        assert_eq!(room_timezone(&db, bot_id, "room_a").await.unwrap(), None);
        set_room_timezone(&db, bot_id, "room_a", -5).await.unwrap();
        assert_eq!(
            room_timezone(&db, bot_id, "room_a").await.unwrap(),
            Some(-5)
        );
        set_room_timezone(&db, bot_id, "room_a", 8).await.unwrap();
        assert_eq!(room_timezone(&db, bot_id, "room_a").await.unwrap(), Some(8));
        db.close().await.unwrap();
    }
}
