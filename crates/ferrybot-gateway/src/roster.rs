// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact-stage handler mirroring agent roster dumps into storage.
//!
//! The agent periodically pushes its full friend and room lists as data
//! events. Each entry is upserted keyed by (bot, wxid); entries that fail
//! to parse are skipped with a warning, never aborting the batch.

use async_trait::async_trait;
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use ferrybot_storage::queries::contacts;
use ferrybot_storage::Database;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct RosterEntry {
    wxid: String,
    #[serde(default, alias = "nickname")]
    name: String,
    #[serde(default, alias = "avatar_url")]
    avatar: String,
}

/// Upserts friend and room roster dumps into the contacts table.
pub struct RosterSyncHandler {
    db: Database,
}

impl RosterSyncHandler {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn ingest(&self, ctx: &EventContext, is_room: bool) -> Result<usize, FerrybotError> {
        let entries = match ctx.raw.data.as_array() {
            Some(entries) => entries.clone(),
            None => {
                warn!(kind = %ctx.original_kind, "roster payload is not an array");
                return Ok(0);
            }
        };

        let mut stored = 0usize;
        for value in entries {
            let entry: RosterEntry = match serde_json::from_value(value) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unparseable roster entry");
                    continue;
                }
            };
            if entry.wxid.is_empty() {
                continue;
            }
            contacts::upsert(
                &self.db,
                ctx.bot.id,
                &entry.wxid,
                &entry.name,
                &entry.avatar,
                is_room,
            )
            .await?;
            stored += 1;
        }
        Ok(stored)
    }
}

#[async_trait]
impl Handler for RosterSyncHandler {
    fn name(&self) -> &'static str {
        "roster_sync"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        let is_room = match ctx.message_kind {
            EventKind::ContactSync => false,
            EventKind::RoomSync => true,
            _ => return next.run(ctx).await,
        };

        let stored = self.ingest(ctx, is_room).await?;
        info!(
            bot = %ctx.bot.wxid,
            kind = %ctx.original_kind,
            stored,
            "roster batch mirrored"
        );
        ctx.claim(self.name());
        Ok(())
    }
}
