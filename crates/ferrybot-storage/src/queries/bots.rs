// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot account lookups and registration.

use ferrybot_core::FerrybotError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::BotRecord;

fn row_to_bot(row: &rusqlite::Row<'_>) -> Result<BotRecord, rusqlite::Error> {
    Ok(BotRecord {
        id: row.get(0)?,
        wxid: row.get(1)?,
        name: row.get(2)?,
        callback_token: row.get(3)?,
        webhook_url: row.get(4)?,
        webhook_secret: row.get(5)?,
        desk_inbox_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const BOT_COLUMNS: &str =
    "id, wxid, name, callback_token, webhook_url, webhook_secret, desk_inbox_id, created_at";

/// Register a bot. Returns the stored record.
pub async fn create(
    db: &Database,
    wxid: &str,
    name: &str,
    callback_token: &str,
) -> Result<BotRecord, FerrybotError> {
    let wxid = wxid.to_string();
    let name = name.to_string();
    let callback_token = callback_token.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bots (wxid, name, callback_token) VALUES (?1, ?2, ?3)",
                params![wxid, name, callback_token],
            )?;
            let id = conn.last_insert_rowid();
            let bot = conn.query_row(
                &format!("SELECT {BOT_COLUMNS} FROM bots WHERE id = ?1"),
                params![id],
                row_to_bot,
            )?;
            Ok(bot)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a bot by its inbound callback token.
pub async fn by_callback_token(
    db: &Database,
    token: &str,
) -> Result<Option<BotRecord>, FerrybotError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {BOT_COLUMNS} FROM bots WHERE callback_token = ?1"),
                params![token],
                row_to_bot,
            );
            match result {
                Ok(bot) => Ok(Some(bot)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a bot by storage id.
pub async fn by_id(db: &Database, id: i64) -> Result<Option<BotRecord>, FerrybotError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {BOT_COLUMNS} FROM bots WHERE id = ?1"),
                params![id],
                row_to_bot,
            );
            match result {
                Ok(bot) => Ok(Some(bot)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// All registered bots.
pub async fn list(db: &Database) -> Result<Vec<BotRecord>, FerrybotError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {BOT_COLUMNS} FROM bots ORDER BY id"))?;
            let bots = stmt
                .query_map([], row_to_bot)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(bots)
        })
        .await
        .map_err(map_tr_err)
}

/// Set the webhook target for a bot. Empty URL disables forwarding.
pub async fn set_webhook(
    db: &Database,
    bot_id: i64,
    url: &str,
    secret: &str,
) -> Result<(), FerrybotError> {
    let url = url.to_string();
    let secret = secret.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE bots SET webhook_url = ?1, webhook_secret = ?2 WHERE id = ?3",
                params![url, secret, bot_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bots.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn create_and_lookup() {
        let (db, _dir) = setup_db().await;
        let bot = create(&db, "bot_w1", "ferry", "tok-1").await.unwrap();
        assert!(bot.id > 0);
        assert_eq!(bot.wxid, "bot_w1");
        assert_eq!(bot.webhook_url, "");

        let found = by_callback_token(&db, "tok-1").await.unwrap().unwrap();
        assert_eq!(found, bot);
        assert!(by_callback_token(&db, "nope").await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_wxid_rejected() {
        let (db, _dir) = setup_db().await;
        create(&db, "bot_w1", "a", "tok-a").await.unwrap();
        assert!(create(&db, "bot_w1", "b", "tok-b").await.is_err());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn webhook_update() {
        let (db, _dir) = setup_db().await;
        let bot = create(&db, "bot_w1", "ferry", "tok-1").await.unwrap();
        set_webhook(&db, bot.id, "https://hooks.example.com/x", "s3cret")
            .await
            .unwrap();
        let bot = by_id(&db, bot.id).await.unwrap().unwrap();
        assert_eq!(bot.webhook_url, "https://hooks.example.com/x");
        assert_eq!(bot.webhook_secret, "s3cret");
        db.close().await.unwrap();
    }
}
