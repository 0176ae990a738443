// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice message and voice transcript normalizers.
//!
//! A voice message produces no text in its own pass: the gateway requests a
//! transcription from the agent, parks the voice URL in the cache under the
//! message id, and claims the event so nothing downstream forwards it. The
//! transcript arrives later as its own event and picks the URL back up. An
//! expired cache entry degrades the final text; it is not an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferrybot_core::traits::{AgentClient, KeyValueCache};
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use tracing::{debug, warn};

use crate::markup::attr;

/// How long a voice URL waits for its transcript.
pub const VOICE_CACHE_TTL: Duration = Duration::from_secs(60);

fn voice_cache_key(msgid: u64) -> String {
    format!("voiceMessage:{msgid}")
}

/// Parks inbound voice messages pending transcription.
pub struct VoiceNormalizer {
    agent: Arc<dyn AgentClient>,
    cache: Arc<dyn KeyValueCache>,
}

impl VoiceNormalizer {
    pub fn new(agent: Arc<dyn AgentClient>, cache: Arc<dyn KeyValueCache>) -> Self {
        Self { agent, cache }
    }
}

#[async_trait]
impl Handler for VoiceNormalizer {
    fn name(&self) -> &'static str {
        "normalize_voice"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::VoiceReceived {
            return next.run(ctx).await;
        }

        let url = attr(&ctx.payload.msg, "voiceurl").unwrap_or_default();
        self.cache
            .put(&voice_cache_key(ctx.payload.msgid), &url, VOICE_CACHE_TTL)
            .await;
        if let Err(e) = self
            .agent
            .request_voice_transcript(&ctx.bot, ctx.payload.msgid)
            .await
        {
            warn!(msgid = ctx.payload.msgid, error = %e, "transcription request failed");
        }
        debug!(msgid = ctx.payload.msgid, "voice parked pending transcript");

        // No text this pass; claiming stops the rest of the stage.
        ctx.claim(self.name());
        Ok(())
    }
}

/// Composes the final text once the transcript event arrives.
pub struct VoiceTranscriptNormalizer {
    cache: Arc<dyn KeyValueCache>,
}

impl VoiceTranscriptNormalizer {
    pub fn new(cache: Arc<dyn KeyValueCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Handler for VoiceTranscriptNormalizer {
    fn name(&self) -> &'static str {
        "normalize_voice_transcript"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::VoiceTranscript {
            return next.run(ctx).await;
        }

        let transcript = ctx.payload.msg.clone();
        let cached = self
            .cache
            .take(&voice_cache_key(ctx.payload.msgid))
            .await
            .filter(|url| !url.is_empty());
        let body = match cached {
            Some(url) => format!("[voice]→[listen]({url})\r\n transcript: {transcript}"),
            None => {
                debug!(msgid = ctx.payload.msgid, "voice cache expired, degraded text");
                format!("[voice message] {transcript}")
            }
        };
        ctx.voice_transcript = Some(transcript);
        ctx.normalize_to_text(body);
        next.run(ctx).await
    }
}
