// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription rows with soft-delete and restore.

use ferrybot_core::FerrybotError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::SubscriptionRecord;

fn row_to_subscription(
    row: &rusqlite::Row<'_>,
) -> Result<SubscriptionRecord, rusqlite::Error> {
    Ok(SubscriptionRecord {
        id: row.get(0)?,
        bot_id: row.get(1)?,
        subscriber_wxid: row.get(2)?,
        keyword: row.get(3)?,
        cron_minute: row.get(4)?,
        cron_hour: row.get(5)?,
        created_at: row.get(6)?,
        deleted_at: row.get(7)?,
    })
}

const SUBSCRIPTION_COLUMNS: &str =
    "id, bot_id, subscriber_wxid, keyword, cron_minute, cron_hour, created_at, deleted_at";

/// The newest row for (bot, subscriber, keyword), soft-deleted rows included.
pub async fn find_including_deleted(
    db: &Database,
    bot_id: i64,
    subscriber_wxid: &str,
    keyword: &str,
) -> Result<Option<SubscriptionRecord>, FerrybotError> {
    let subscriber_wxid = subscriber_wxid.to_string();
    let keyword = keyword.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
                     WHERE bot_id = ?1 AND subscriber_wxid = ?2 AND keyword = ?3
                     ORDER BY deleted_at IS NULL DESC, id DESC
                     LIMIT 1"
                ),
                params![bot_id, subscriber_wxid, keyword],
                row_to_subscription,
            );
            match result {
                Ok(sub) => Ok(Some(sub)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a fresh subscription row.
pub async fn insert(
    db: &Database,
    bot_id: i64,
    subscriber_wxid: &str,
    keyword: &str,
    cron_minute: u8,
    cron_hour: u8,
) -> Result<SubscriptionRecord, FerrybotError> {
    let subscriber_wxid = subscriber_wxid.to_string();
    let keyword = keyword.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO subscriptions
                     (bot_id, subscriber_wxid, keyword, cron_minute, cron_hour)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![bot_id, subscriber_wxid, keyword, cron_minute, cron_hour],
            )?;
            let id = conn.last_insert_rowid();
            let sub = conn.query_row(
                &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?1"),
                params![id],
                row_to_subscription,
            )?;
            Ok(sub)
        })
        .await
        .map_err(map_tr_err)
}

/// Clear the soft-delete marker, leaving the schedule untouched.
pub async fn restore(db: &Database, id: i64) -> Result<SubscriptionRecord, FerrybotError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE subscriptions SET deleted_at = NULL WHERE id = ?1",
                params![id],
            )?;
            let sub = conn.query_row(
                &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?1"),
                params![id],
                row_to_subscription,
            )?;
            Ok(sub)
        })
        .await
        .map_err(map_tr_err)
}

/// Soft-delete the live row for (bot, subscriber, keyword).
///
/// Returns whether a live row existed.
pub async fn soft_delete(
    db: &Database,
    bot_id: i64,
    subscriber_wxid: &str,
    keyword: &str,
) -> Result<bool, FerrybotError> {
    let subscriber_wxid = subscriber_wxid.to_string();
    let keyword = keyword.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE subscriptions
                 SET deleted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE bot_id = ?1 AND subscriber_wxid = ?2 AND keyword = ?3
                   AND deleted_at IS NULL",
                params![bot_id, subscriber_wxid, keyword],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Live subscriptions for one subscriber.
pub async fn list_for_subscriber(
    db: &Database,
    bot_id: i64,
    subscriber_wxid: &str,
) -> Result<Vec<SubscriptionRecord>, FerrybotError> {
    let subscriber_wxid = subscriber_wxid.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
                 WHERE bot_id = ?1 AND subscriber_wxid = ?2 AND deleted_at IS NULL
                 ORDER BY keyword"
            ))?;
            let subs = stmt
                .query_map(params![bot_id, subscriber_wxid], row_to_subscription)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(subs)
        })
        .await
        .map_err(map_tr_err)
}

/// All live subscriptions across bots scheduled for (minute, hour).
pub async fn due_at(
    db: &Database,
    minute: u8,
    hour: u8,
) -> Result<Vec<SubscriptionRecord>, FerrybotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
                 WHERE cron_minute = ?1 AND cron_hour = ?2 AND deleted_at IS NULL
                 ORDER BY id"
            ))?;
            let subs = stmt
                .query_map(params![minute, hour], row_to_subscription)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(subs)
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
        let path = dir.path().join("subs.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let bot = bots::create(&db, "bot_w1", "ferry", "tok").await.unwrap();
        (db, bot.id, dir)
    }

    #[tokio::test]
    async fn insert_and_list() {
        let (db, bot_id, _dir) = setup().await;
        insert(&db, bot_id, "u1", "news", 30, 8).await.unwrap();
        insert(&db, bot_id, "u1", "weather", 0, 7).await.unwrap();
        let subs = list_for_subscriber(&db, bot_id, "u1").await.unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].keyword, "news");
        assert_eq!(subs[0].cron_expression(), "30 8 * * *");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn live_uniqueness_enforced() {
        let (db, bot_id, _dir) = setup().await;
        insert(&db, bot_id, "u1", "news", 30, 8).await.unwrap();
        assert!(insert(&db, bot_id, "u1", "news", 0, 9).await.is_err());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn soft_delete_then_reinsert_allowed() {
        let (db, bot_id, _dir) = setup().await;
        let original = insert(&db, bot_id, "u1", "news", 30, 8).await.unwrap();
        assert!(soft_delete(&db, bot_id, "u1", "news").await.unwrap());
        // Deleting again finds nothing live.
        assert!(!soft_delete(&db, bot_id, "u1", "news").await.unwrap());

        let found = find_including_deleted(&db, bot_id, "u1", "news")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, original.id);
        assert!(found.is_deleted());

        let restored = restore(&db, found.id).await.unwrap();
        assert!(!restored.is_deleted());
        assert_eq!(restored.cron_minute, 30);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn due_at_matches_schedule() {
        let (db, bot_id, _dir) = setup().await;
        insert(&db, bot_id, "u1", "news", 30, 8).await.unwrap();
        insert(&db, bot_id, "u2", "news", 30, 8).await.unwrap();
        insert(&db, bot_id, "u3", "news", 0, 9).await.unwrap();
        soft_delete(&db, bot_id, "u2", "news").await.unwrap();

        let due = due_at(&db, 30, 8).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].subscriber_wxid, "u1");
        db.close().await.unwrap();
    }
}
