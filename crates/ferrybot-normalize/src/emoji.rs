// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Emoji message normalizer.

use async_trait::async_trait;
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use tracing::debug;

use crate::markup::attr;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Rewrites emoji messages into a markdown-style view link with dimensions
/// and size. A missing cdn url degrades to a placeholder body; the kind is
/// converted either way.
pub struct EmojiNormalizer;

fn compose(body: &str) -> String {
    let Some(url) = attr(body, "cdnurl").filter(|u| !u.is_empty()) else {
        return "[emoji] link empty".to_string();
    };
    let width = attr(body, "width").unwrap_or_default();
    let height = attr(body, "height").unwrap_or_default();
    let size_mb = attr(body, "len")
        .and_then(|l| l.parse::<f64>().ok())
        .map(|len| len / BYTES_PER_MB)
        .unwrap_or(0.0);
    format!("[emoji]→[view]({url}) {width}x{height} {size_mb:.2}M")
}

#[async_trait]
impl Handler for EmojiNormalizer {
    fn name(&self) -> &'static str {
        "normalize_emoji"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::EmojiReceived {
            return next.run(ctx).await;
        }
        let body = compose(&ctx.payload.msg);
        if body.ends_with("link empty") {
            debug!(msgid = ctx.payload.msgid, "emoji without cdnurl");
        }
        ctx.normalize_to_text(body);
        next.run(ctx).await
    }
}
