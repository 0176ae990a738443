// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System-notice normalizer: quote stripping, room contact provisioning,
//! and membership-change detection.
//!
//! Membership changes arrive as free-text phrasings that vary by locale.
//! Classification runs an ordered pattern table; the first match wins, so
//! more specific phrasings ("You removed ...") must precede the generic
//! ones. Each pattern captures the member's display name as `name`.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use ferrybot_core::traits::{AgentClient, DeskContact, DeskSync};
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use ferrybot_settings::{SettingKey, SettingsService};
use ferrybot_storage::queries::contacts;
use ferrybot_storage::Database;
use regex::Regex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Joined,
    Left,
}

/// One locale phrasing of a membership notice.
struct NoticePattern {
    pattern: &'static str,
    change: MembershipChange,
}

/// Ordered phrasing table. Removal phrasings come before the generic
/// "left" ones because some locales embed one in the other.
const NOTICE_PATTERNS: &[NoticePattern] = &[
    NoticePattern {
        pattern: r#"你将"(?P<name>[^"]+)"移出了群聊"#,
        change: MembershipChange::Left,
    },
    NoticePattern {
        pattern: r#"You removed "(?P<name>[^"]+)" from the group chat"#,
        change: MembershipChange::Left,
    },
    NoticePattern {
        pattern: r#""(?P<name>[^"]+)"退出了群聊"#,
        change: MembershipChange::Left,
    },
    NoticePattern {
        pattern: r#""(?P<name>[^"]+)" left the group chat"#,
        change: MembershipChange::Left,
    },
    NoticePattern {
        pattern: r#"你邀请"(?P<name>[^"]+)"加入了群聊"#,
        change: MembershipChange::Joined,
    },
    NoticePattern {
        pattern: r#""[^"]+"邀请"(?P<name>[^"]+)"加入了群聊"#,
        change: MembershipChange::Joined,
    },
    NoticePattern {
        pattern: r#""(?P<name>[^"]+)"通过扫描.*二维码加入群聊"#,
        change: MembershipChange::Joined,
    },
    NoticePattern {
        pattern: r#"You invited "(?P<name>[^"]+)" to the group chat"#,
        change: MembershipChange::Joined,
    },
    NoticePattern {
        pattern: r#""[^"]+" invited "(?P<name>[^"]+)" to the group chat"#,
        change: MembershipChange::Joined,
    },
    NoticePattern {
        pattern: r#""(?P<name>[^"]+)" joined the group chat via .*QR code"#,
        change: MembershipChange::Joined,
    },
];

static COMPILED_PATTERNS: LazyLock<Vec<(Regex, MembershipChange)>> = LazyLock::new(|| {
    NOTICE_PATTERNS
        .iter()
        .map(|p| {
            // Table patterns are static and verified by tests.
            (Regex::new(p.pattern).expect("invalid notice pattern"), p.change)
        })
        .collect()
});

/// Classify a notice body, returning the change and the member name.
pub fn classify_membership(body: &str) -> Option<(MembershipChange, String)> {
    for (regex, change) in COMPILED_PATTERNS.iter() {
        if let Some(caps) = regex.captures(body) {
            let name = caps.name("name").map(|m| m.as_str().to_string())?;
            return Some((*change, name));
        }
    }
    None
}

/// Normalizes system notices and reacts to room membership changes.
pub struct SystemNoticeNormalizer {
    db: Database,
    settings: SettingsService,
    agent: Arc<dyn AgentClient>,
    desk: Arc<dyn DeskSync>,
}

impl SystemNoticeNormalizer {
    pub fn new(
        db: Database,
        settings: SettingsService,
        agent: Arc<dyn AgentClient>,
        desk: Arc<dyn DeskSync>,
    ) -> Self {
        Self {
            db,
            settings,
            agent,
            desk,
        }
    }

    /// Make sure the room exists as a contact, synthesizing a minimal
    /// record and mirroring it to the desk when absent.
    async fn ensure_room_contact(&self, ctx: &EventContext) -> Result<(), FerrybotError> {
        if contacts::find(&self.db, ctx.bot.id, &ctx.room_id).await?.is_some() {
            return Ok(());
        }
        let record =
            contacts::upsert(&self.db, ctx.bot.id, &ctx.room_id, &ctx.room_id, "", true).await?;
        info!(room = %ctx.room_id, "synthesized contact for unknown room");
        let contact = DeskContact {
            wxid: record.wxid,
            name: record.name,
            avatar: record.avatar,
            is_room: true,
        };
        if let Err(e) = self.desk.ensure_contact(&ctx.bot, &contact).await {
            warn!(room = %ctx.room_id, error = %e, "desk contact mirror failed");
        }
        Ok(())
    }

    /// Send the group-facing notification, unless the room is suppressed.
    async fn announce(
        &self,
        ctx: &EventContext,
        change: MembershipChange,
        name: &str,
    ) -> Result<(), FerrybotError> {
        let enabled = self
            .settings
            .effective(ctx.bot.id, SettingKey::RoomMessages, Some(&ctx.room_id))
            .await?;
        if !enabled {
            debug!(room = %ctx.room_id, "membership notification suppressed");
            return Ok(());
        }
        let body = match change {
            MembershipChange::Joined => format!("Welcome @{name} to the group!"),
            MembershipChange::Left => format!("@{name} left the group."),
        };
        if let Err(e) = self.agent.send_text(&ctx.bot, &ctx.room_id, &body).await {
            warn!(room = %ctx.room_id, error = %e, "membership notification failed");
        }
        Ok(())
    }
}

#[async_trait]
impl Handler for SystemNoticeNormalizer {
    fn name(&self) -> &'static str {
        "normalize_system"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::SystemNotice {
            return next.run(ctx).await;
        }

        let stripped = crate::markup::strip_wrapping_quotes(&ctx.payload.msg).to_string();

        if ctx.is_room_message() {
            if let Some((change, name)) = classify_membership(&stripped) {
                self.ensure_room_contact(ctx).await?;
                self.announce(ctx, change, &name).await?;
            }
        }

        ctx.normalize_to_text(stripped);
        next.run(ctx).await
    }
}
