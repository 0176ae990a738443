// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-triggered resource lookups.

use ferrybot_core::FerrybotError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::KeywordResource;

fn row_to_resource(row: &rusqlite::Row<'_>) -> Result<KeywordResource, rusqlite::Error> {
    Ok(KeywordResource {
        id: row.get(0)?,
        bot_id: row.get(1)?,
        keyword: row.get(2)?,
        title: row.get(3)?,
        url: row.get(4)?,
        content: row.get(5)?,
    })
}

const RESOURCE_COLUMNS: &str = "id, bot_id, keyword, title, url, content";

/// Find the resource for a keyword, preferring a bot-specific row over a
/// shared one. `None` is the expected fall-through case, not an error.
pub async fn find_by_keyword(
    db: &Database,
    bot_id: i64,
    keyword: &str,
) -> Result<Option<KeywordResource>, FerrybotError> {
    let keyword = keyword.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {RESOURCE_COLUMNS} FROM keyword_resources
                     WHERE keyword = ?1 AND (bot_id = ?2 OR bot_id IS NULL)
                     ORDER BY bot_id IS NULL
                     LIMIT 1"
                ),
                params![keyword, bot_id],
                row_to_resource,
            );
            match result {
                Ok(resource) => Ok(Some(resource)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a resource row.
pub async fn insert(
    db: &Database,
    bot_id: Option<i64>,
    keyword: &str,
    title: &str,
    url: &str,
    content: &str,
) -> Result<i64, FerrybotError> {
    let keyword = keyword.to_string();
    let title = title.to_string();
    let url = url.to_string();
    let content = content.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO keyword_resources (bot_id, keyword, title, url, content)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![bot_id, keyword, title, url, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::bots;
    use tempfile::tempdir;

    #[tokio::test]
    async fn bot_specific_beats_shared() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resources.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let bot = bots::create(&db, "bot_w1", "ferry", "tok").await.unwrap();

        insert(&db, None, "news", "Shared news", "http://a/shared", "")
            .await
            .unwrap();
        insert(&db, Some(bot.id), "news", "Bot news", "http://a/bot", "")
            .await
            .unwrap();

        let found = find_by_keyword(&db, bot.id, "news").await.unwrap().unwrap();
        assert_eq!(found.title, "Bot news");

        assert!(find_by_keyword(&db, bot.id, "nothing").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
