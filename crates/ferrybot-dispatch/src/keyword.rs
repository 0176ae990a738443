// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-resource dispatch with short-TTL duplicate suppression.
//!
//! An exact (trimmed) match in the resource store sends the resource to
//! the reply target. The de-dup window is best effort: the cache entry is
//! written after the send, so a true race can still double-send, which the
//! domain accepts. No match is a silent fall-through, never an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferrybot_core::traits::{AgentClient, KeyValueCache};
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use ferrybot_settings::{SettingKey, SettingsService};
use ferrybot_storage::queries::resources;
use ferrybot_storage::Database;
use tracing::{debug, info, warn};

use crate::desk::{enqueue_desk_job, DeskJob};

/// Suppression window for resending the same resource to the same target.
pub const DEDUP_TTL: Duration = Duration::from_secs(10);

fn dedup_key(bot_wxid: &str, target: &str, body: &str) -> String {
    format!(
        "keywordReplied:{bot_wxid}:{target}:{:x}",
        md5::compute(body)
    )
}

/// Message-stage handler answering keyword messages with stored resources.
pub struct KeywordResourceHandler {
    db: Database,
    settings: SettingsService,
    cache: Arc<dyn KeyValueCache>,
    agent: Arc<dyn AgentClient>,
}

impl KeywordResourceHandler {
    pub fn new(
        db: Database,
        settings: SettingsService,
        cache: Arc<dyn KeyValueCache>,
        agent: Arc<dyn AgentClient>,
    ) -> Self {
        Self {
            db,
            settings,
            cache,
            agent,
        }
    }
}

#[async_trait]
impl Handler for KeywordResourceHandler {
    fn name(&self) -> &'static str {
        "keyword_resource"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.is_claimed()
            || ctx.message_kind != EventKind::TextReceived
            || ctx.is_from_bot_self
        {
            return next.run(ctx).await;
        }

        let room = (!ctx.room_id.is_empty()).then_some(ctx.room_id.as_str());
        if !self
            .settings
            .effective(ctx.bot.id, SettingKey::KeywordResources, room)
            .await?
        {
            return next.run(ctx).await;
        }

        let keyword = ctx.text().trim().to_string();
        let Some(resource) = resources::find_by_keyword(&self.db, ctx.bot.id, &keyword).await?
        else {
            return next.run(ctx).await;
        };

        let key = dedup_key(&ctx.bot.wxid, ctx.reply_target(), &keyword);
        if self.cache.get(&key).await.is_some() {
            debug!(keyword, target = %ctx.reply_target(), "duplicate suppressed");
            ctx.claim(self.name());
            return Ok(());
        }

        let body = resource.render();
        self.agent
            .send_text(&ctx.bot, ctx.reply_target(), &body)
            .await?;
        ctx.replied = true;
        self.cache.put(&key, "1", DEDUP_TTL).await;
        info!(keyword, target = %ctx.reply_target(), "keyword resource sent");

        if self
            .settings
            .effective(ctx.bot.id, SettingKey::KeywordSync, room)
            .await?
        {
            let job = DeskJob {
                bot_id: ctx.bot.id,
                sender: ctx.bot.wxid.clone(),
                sender_name: ctx.bot.name.clone(),
                room_id: ctx.room_id.clone(),
                content: body,
                outgoing: true,
            };
            if let Err(e) = enqueue_desk_job(&self.db, &job).await {
                warn!(error = %e, "keyword desk mirror enqueue failed");
            }
        }

        ctx.claim(self.name());
        Ok(())
    }
}
