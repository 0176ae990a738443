// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Desk-sync policy handler and the background delivery worker.
//!
//! The inbound path only enqueues; the worker drains the queue and talks
//! to the desk. Delivery is at-least-once with idempotent desk-side
//! operations; a failed attempt goes back to pending until the queue
//! parks it as failed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferrybot_core::traits::{DeskContact, DeskMessage, DeskSync};
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use ferrybot_settings::{SettingKey, SettingsService};
use ferrybot_storage::queries::{bots, contacts, jobs};
use ferrybot_storage::Database;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Queue name for desk-sync deliveries.
pub const DESK_SYNC_QUEUE: &str = "desk_sync";

/// One queued desk-sync delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeskJob {
    pub bot_id: i64,
    pub sender: String,
    pub sender_name: String,
    /// Empty for direct messages.
    pub room_id: String,
    pub content: String,
    pub outgoing: bool,
}

/// Serialize and enqueue a desk-sync job.
pub async fn enqueue_desk_job(db: &Database, job: &DeskJob) -> Result<i64, FerrybotError> {
    let payload = serde_json::to_string(job)
        .map_err(|e| FerrybotError::Internal(format!("desk job serialize: {e}")))?;
    jobs::enqueue(db, DESK_SYNC_QUEUE, &payload).await
}

/// Message-stage policy handler mirroring canonical text to the desk.
///
/// Enqueue-only and fire-and-forget: enqueue failures are logged, never
/// surfaced, and the handler always continues the stage.
pub struct DeskSyncHandler {
    db: Database,
    settings: SettingsService,
}

impl DeskSyncHandler {
    pub fn new(db: Database, settings: SettingsService) -> Self {
        Self { db, settings }
    }
}

#[async_trait]
impl Handler for DeskSyncHandler {
    fn name(&self) -> &'static str {
        "desk_sync"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::TextReceived || ctx.sender.is_empty() {
            return next.run(ctx).await;
        }

        let room = (!ctx.room_id.is_empty()).then_some(ctx.room_id.as_str());
        let enabled = self
            .settings
            .effective(ctx.bot.id, SettingKey::DeskSync, room)
            .await?;
        if enabled {
            let job = DeskJob {
                bot_id: ctx.bot.id,
                sender: ctx.sender.clone(),
                sender_name: ctx.payload.from_remark.clone(),
                room_id: ctx.room_id.clone(),
                content: ctx.text().to_string(),
                outgoing: ctx.is_from_bot_self,
            };
            if let Err(e) = enqueue_desk_job(&self.db, &job).await {
                warn!(error = %e, "desk sync enqueue failed");
            }
        }
        next.run(ctx).await
    }
}

/// Background worker draining the desk-sync queue.
pub struct DeskSyncWorker {
    db: Database,
    desk: Arc<dyn DeskSync>,
    poll_interval: Duration,
}

impl DeskSyncWorker {
    pub fn new(db: Database, desk: Arc<dyn DeskSync>, poll_interval: Duration) -> Self {
        Self {
            db,
            desk,
            poll_interval,
        }
    }

    /// Run until cancelled, draining eagerly and sleeping when idle.
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("desk sync worker shutting down");
                    return;
                }
                worked = self.process_one() => {
                    match worked {
                        Ok(true) => {}
                        Ok(false) => tokio::time::sleep(self.poll_interval).await,
                        Err(e) => {
                            warn!(error = %e, "desk sync poll failed");
                            tokio::time::sleep(self.poll_interval).await;
                        }
                    }
                }
            }
        }
    }

    /// Claim and deliver one job. Returns whether a job was claimed.
    pub async fn process_one(&self) -> Result<bool, FerrybotError> {
        let Some(job) = jobs::claim_next(&self.db, DESK_SYNC_QUEUE).await? else {
            return Ok(false);
        };
        match self.deliver(&job.payload).await {
            Ok(()) => {
                jobs::complete(&self.db, job.id).await?;
                debug!(job_id = job.id, "desk sync delivered");
            }
            Err(e) => {
                warn!(job_id = job.id, attempts = job.attempts, error = %e, "desk sync failed");
                jobs::fail(&self.db, job.id).await?;
            }
        }
        Ok(true)
    }

    async fn deliver(&self, payload: &str) -> Result<(), FerrybotError> {
        let job: DeskJob = serde_json::from_str(payload)
            .map_err(|e| FerrybotError::Internal(format!("desk job payload: {e}")))?;
        let bot = bots::by_id(&self.db, job.bot_id)
            .await?
            .ok_or_else(|| FerrybotError::UnknownBot(job.bot_id.to_string()))?;
        let identity = bot.identity();

        // The desk conversation is keyed by the peer: the room for room
        // traffic, the counterpart user otherwise.
        let peer = if job.room_id.is_empty() {
            &job.sender
        } else {
            &job.room_id
        };
        let known = contacts::find(&self.db, job.bot_id, peer).await?;
        let contact = match known {
            Some(c) => DeskContact {
                wxid: c.wxid,
                name: c.name,
                avatar: c.avatar,
                is_room: c.is_room,
            },
            None => DeskContact {
                wxid: peer.clone(),
                name: if job.sender_name.is_empty() {
                    peer.clone()
                } else {
                    job.sender_name.clone()
                },
                avatar: String::new(),
                is_room: !job.room_id.is_empty(),
            },
        };
        self.desk.ensure_contact(&identity, &contact).await?;
        self.desk
            .sync_message(
                &identity,
                &DeskMessage {
                    sender: job.sender,
                    room_id: job.room_id,
                    content: job.content,
                    outgoing: job.outgoing,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrybot_core::Stage;
    use ferrybot_settings::Scope;
    use ferrybot_test_utils::{RecordingDeskSync, TestHarness};

    #[tokio::test]
    async fn policy_enqueues_when_enabled() {
        let h = TestHarness::new().await.unwrap();
        h.settings()
            .set(h.bot.id, SettingKey::DeskSync, Scope::Global, None, true)
            .await
            .unwrap();
        let stage = Stage::new("message")
            .handler(Arc::new(DeskSyncHandler::new(h.db.clone(), h.settings())));

        let mut ctx = h.text_context("user_1", "", "hello desk");
        stage.run(&mut ctx).await.unwrap();

        // The handler never claims; forwarding continues downstream.
        assert!(!ctx.is_claimed());
        let job = jobs::claim_next(&h.db, DESK_SYNC_QUEUE).await.unwrap().unwrap();
        let payload: DeskJob = serde_json::from_str(&job.payload).unwrap();
        assert_eq!(payload.content, "hello desk");
        assert!(!payload.outgoing);
    }

    #[tokio::test]
    async fn policy_respects_room_override() {
        let h = TestHarness::new().await.unwrap();
        h.settings()
            .set(h.bot.id, SettingKey::DeskSync, Scope::Global, None, true)
            .await
            .unwrap();
        h.settings()
            .set(
                h.bot.id,
                SettingKey::DeskSync,
                Scope::Room("room_q".into()),
                None,
                false,
            )
            .await
            .unwrap();
        let stage = Stage::new("message")
            .handler(Arc::new(DeskSyncHandler::new(h.db.clone(), h.settings())));

        let mut ctx = h.text_context("user_1", "room_q", "not mirrored");
        stage.run(&mut ctx).await.unwrap();
        assert!(jobs::claim_next(&h.db, DESK_SYNC_QUEUE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn worker_delivers_and_completes() {
        let h = TestHarness::new().await.unwrap();
        let job = DeskJob {
            bot_id: h.bot.id,
            sender: "user_1".into(),
            sender_name: "Ada".into(),
            room_id: String::new(),
            content: "hello".into(),
            outgoing: false,
        };
        enqueue_desk_job(&h.db, &job).await.unwrap();

        let desk = Arc::new(RecordingDeskSync::new());
        let worker = DeskSyncWorker::new(
            h.db.clone(),
            Arc::clone(&desk) as Arc<dyn DeskSync>,
            Duration::from_millis(10),
        );
        assert!(worker.process_one().await.unwrap());
        assert!(!worker.process_one().await.unwrap());

        let contacts = desk.contacts().await;
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].wxid, "user_1");
        assert_eq!(contacts[0].name, "Ada");
        let messages = desk.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn worker_uses_room_as_peer() {
        let h = TestHarness::new().await.unwrap();
        contacts::upsert(&h.db, h.bot.id, "room_a", "Team Room", "", true)
            .await
            .unwrap();
        let job = DeskJob {
            bot_id: h.bot.id,
            sender: "user_1".into(),
            sender_name: String::new(),
            room_id: "room_a".into(),
            content: "in room".into(),
            outgoing: false,
        };
        enqueue_desk_job(&h.db, &job).await.unwrap();

        let desk = Arc::new(RecordingDeskSync::new());
        let worker = DeskSyncWorker::new(
            h.db.clone(),
            Arc::clone(&desk) as Arc<dyn DeskSync>,
            Duration::from_millis(10),
        );
        worker.process_one().await.unwrap();

        let contacts_seen = desk.contacts().await;
        assert_eq!(contacts_seen[0].wxid, "room_a");
        assert_eq!(contacts_seen[0].name, "Team Room");
        assert!(contacts_seen[0].is_room);
    }

    #[tokio::test]
    async fn bad_payload_counts_as_failed_attempt() {
        let h = TestHarness::new().await.unwrap();
        jobs::enqueue(&h.db, DESK_SYNC_QUEUE, "not json").await.unwrap();

        let desk = Arc::new(RecordingDeskSync::new());
        let worker = DeskSyncWorker::new(
            h.db.clone(),
            Arc::clone(&desk) as Arc<dyn DeskSync>,
            Duration::from_millis(10),
        );
        assert!(worker.process_one().await.unwrap());
        assert!(desk.messages().await.is_empty());
    }
}
