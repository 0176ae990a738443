// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Location message normalizer.

use async_trait::async_trait;
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};

use crate::markup::{attr, tag_text};

const FIELDS: &[&str] = &["poiname", "label", "lat", "lng"];

/// Rewrites shared locations into a `" - "`-joined description.
///
/// The agent emits location markup in two shapes: tag-based
/// (`<location><label>...</label></location>`) and attribute-based
/// (`<location label="..." lat="..." lng="..."/>`); tags are tried first, then
/// attribute scraping for the same names.
pub struct LocationNormalizer;

fn compose(body: &str) -> String {
    let mut parts: Vec<String> = FIELDS
        .iter()
        .filter_map(|f| tag_text(body, f))
        .filter(|v| !v.is_empty())
        .collect();
    if parts.is_empty() {
        parts = FIELDS
            .iter()
            .filter_map(|f| attr(body, f))
            .filter(|v| !v.is_empty())
            .collect();
    }
    if parts.is_empty() {
        return "[location] location shared".to_string();
    }
    format!("[location] {}", parts.join(" - "))
}

#[async_trait]
impl Handler for LocationNormalizer {
    fn name(&self) -> &'static str {
        "normalize_location"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::LocationReceived {
            return next.run(ctx).await;
        }
        ctx.normalize_to_text(compose(&ctx.payload.msg));
        next.run(ctx).await
    }
}
