// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Link-card normalizer: plain links, official-account articles, and group
//! invites.
//!
//! The three shapes share one markup layout but want different templates
//! and different URL fallbacks, so classification happens first and the
//! body is composed per class.

use async_trait::async_trait;
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use tracing::debug;

use crate::markup::tag_text;

/// Official-account article host.
const OFFICIAL_ACCOUNT_DOMAIN: &str = "mp.weixin.qq.com";

/// App-message codes a group invite card arrives with.
const GROUP_INVITE_SUB_TYPE: i64 = 5;
const GROUP_INVITE_TYPE: i64 = 49;

/// Whether a link card is a group-chat invite.
///
/// The sub-type/type pair alone is ambiguous; the body must also carry both
/// an invite marker and a group-chat marker, in either Chinese or English
/// phrasing.
pub fn is_group_invite(sub_type: i64, app_type: i64, body: &str) -> bool {
    if sub_type != GROUP_INVITE_SUB_TYPE || app_type != GROUP_INVITE_TYPE {
        return false;
    }
    let invite = body.contains("邀请") || body.to_lowercase().contains("invite");
    let group = body.contains("群聊") || body.to_lowercase().contains("group chat");
    invite && group
}

/// Whether the link came from an official account.
fn is_official_account(sender: &str, url: &str) -> bool {
    sender.starts_with("gh_") || url.contains(OFFICIAL_ACCOUNT_DOMAIN)
}

struct LinkFields {
    title: String,
    description: String,
    url: Option<String>,
    source_name: String,
}

fn extract(body: &str, group_invite: bool) -> LinkFields {
    let url = tag_text(body, "url")
        .filter(|u| !u.is_empty())
        .or_else(|| tag_text(body, "dataurl").filter(|u| !u.is_empty()))
        .or_else(|| {
            if group_invite {
                tag_text(body, "thumburl").filter(|u| !u.is_empty())
            } else {
                None
            }
        });
    LinkFields {
        title: tag_text(body, "title").unwrap_or_default(),
        description: tag_text(body, "des").unwrap_or_default(),
        url,
        source_name: tag_text(body, "sourcedisplayname").unwrap_or_default(),
    }
}

/// Normalizes link cards into text, with distinct templates for official
/// accounts and group invites.
pub struct LinkNormalizer;

fn compose(sender: &str, sub_type: i64, app_type: i64, body: &str) -> String {
    let group_invite = is_group_invite(sub_type, app_type, body);
    let fields = extract(body, group_invite);
    let url = fields.url.as_deref().unwrap_or("");

    let mut lines: Vec<String> = Vec::new();
    if group_invite {
        lines.push(format!("[group invite] {}", fields.title));
    } else if is_official_account(sender, url) {
        let source = if fields.source_name.is_empty() {
            sender
        } else {
            &fields.source_name
        };
        lines.push(format!("[official account] {}: {}", source, fields.title));
    } else {
        lines.push(format!("[link] {}", fields.title));
    }
    if !fields.description.is_empty() {
        lines.push(fields.description);
    }
    match fields.url {
        Some(url) => lines.push(url),
        None => lines.push("(link empty)".to_string()),
    }
    lines.join("\n")
}

#[async_trait]
impl Handler for LinkNormalizer {
    fn name(&self) -> &'static str {
        "normalize_link"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::LinkReceived {
            return next.run(ctx).await;
        }
        let body = compose(
            &ctx.sender,
            ctx.payload.wx_sub_type,
            ctx.payload.wx_type,
            &ctx.payload.msg,
        );
        debug!(msgid = ctx.payload.msgid, "link normalized");
        ctx.normalize_to_text(body);
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = "<msg><appmsg><title>Read this</title>\
        <des>interesting article</des>\
        <url><![CDATA[https://example.com/post]]></url></appmsg></msg>";

    #[test]
    fn plain_link_template() {
        let body = compose("user_1", 0, 0, PLAIN);
        assert_eq!(
            body,
            "[link] Read this\ninteresting article\nhttps://example.com/post"
        );
    }

    #[test]
    fn official_account_by_sender_prefix() {
        let body = compose("gh_abc123", 0, 0, PLAIN);
        assert!(body.starts_with("[official account] gh_abc123: Read this"));
    }

    #[test]
    fn official_account_by_domain() {
        let markup = "<msg><appmsg><title>Post</title>\
            <sourcedisplayname>Tech Daily</sourcedisplayname>\
            <url><![CDATA[https://mp.weixin.qq.com/s/xyz]]></url></appmsg></msg>";
        let body = compose("user_1", 0, 0, markup);
        assert!(body.starts_with("[official account] Tech Daily: Post"));
    }

    #[test]
    fn group_invite_requires_content_corroboration() {
        let invite = "<msg><appmsg><title>\"A\"邀请你加入群聊</title>\
            <thumburl><![CDATA[https://thumb/x]]></thumburl></appmsg></msg>";
        assert!(is_group_invite(5, 49, invite));
        // Codes without corroborating body text do not qualify.
        assert!(!is_group_invite(5, 49, PLAIN));
        // Body text without the codes does not qualify.
        assert!(!is_group_invite(0, 49, invite));
        assert!(!is_group_invite(5, 0, invite));
    }

    #[test]
    fn group_invite_falls_back_to_thumburl() {
        let invite = "<msg><appmsg><title>\"A\" invites you to a group chat</title>\
            <thumburl><![CDATA[https://thumb/x]]></thumburl></appmsg></msg>";
        let body = compose("user_1", 5, 49, invite);
        assert!(body.starts_with("[group invite]"));
        assert!(body.contains("https://thumb/x"));
    }

    #[test]
    fn plain_link_never_uses_thumburl() {
        let markup = "<msg><appmsg><title>t</title>\
            <thumburl><![CDATA[https://thumb/x]]></thumburl></appmsg></msg>";
        let body = compose("user_1", 0, 0, markup);
        assert!(body.contains("(link empty)"));
    }

    #[test]
    fn dataurl_beats_thumburl() {
        let markup = "<msg><appmsg><title>t</title>\
            <dataurl><![CDATA[https://data/x]]></dataurl>\
            <thumburl><![CDATA[https://thumb/x]]></thumburl></appmsg></msg>";
        let body = compose("user_1", 0, 0, markup);
        assert!(body.contains("https://data/x"));
    }
}
