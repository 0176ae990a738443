// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact records mirrored from the agent's contact list.

use ferrybot_core::FerrybotError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::ContactRecord;

fn row_to_contact(row: &rusqlite::Row<'_>) -> Result<ContactRecord, rusqlite::Error> {
    Ok(ContactRecord {
        id: row.get(0)?,
        bot_id: row.get(1)?,
        wxid: row.get(2)?,
        name: row.get(3)?,
        remark: row.get(4)?,
        avatar: row.get(5)?,
        is_room: row.get(6)?,
    })
}

const CONTACT_COLUMNS: &str = "id, bot_id, wxid, name, remark, avatar, is_room";

/// Insert or refresh a contact, keyed by (bot, wxid).
pub async fn upsert(
    db: &Database,
    bot_id: i64,
    wxid: &str,
    name: &str,
    avatar: &str,
    is_room: bool,
) -> Result<ContactRecord, FerrybotError> {
    let wxid = wxid.to_string();
    let name = name.to_string();
    let avatar = avatar.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO contacts (bot_id, wxid, name, avatar, is_room)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (bot_id, wxid) DO UPDATE SET
                     name = excluded.name,
                     avatar = excluded.avatar,
                     is_room = excluded.is_room",
                params![bot_id, wxid, name, avatar, is_room],
            )?;
            let contact = conn.query_row(
                &format!(
                    "SELECT {CONTACT_COLUMNS} FROM contacts WHERE bot_id = ?1 AND wxid = ?2"
                ),
                params![bot_id, wxid],
                row_to_contact,
            )?;
            Ok(contact)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up one contact.
pub async fn find(
    db: &Database,
    bot_id: i64,
    wxid: &str,
) -> Result<Option<ContactRecord>, FerrybotError> {
    let wxid = wxid.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {CONTACT_COLUMNS} FROM contacts WHERE bot_id = ?1 AND wxid = ?2"
                ),
                params![bot_id, wxid],
                row_to_contact,
            );
            match result {
                Ok(contact) => Ok(Some(contact)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
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
    async fn upsert_refreshes_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let bot = bots::create(&db, "bot_w1", "ferry", "tok").await.unwrap();

        let first = upsert(&db, bot.id, "room_a", "Devs", "", true).await.unwrap();
        let second = upsert(&db, bot.id, "room_a", "Dev Chat", "http://a/x.png", true)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Dev Chat");
        assert!(second.is_room);

        assert!(find(&db, bot.id, "nobody").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
