// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Other-app message normalizer: sub-type code dispatch.

use async_trait::async_trait;
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};

use crate::markup::{attr, tag_text};

const SUB_TYPE_AUDIO: i64 = 34;
const SUB_TYPE_CHAT_LOG: i64 = 19;
const SUB_TYPE_CLOUD_FILE: i64 = 6;
const SUB_TYPE_SHORT_VIDEO: i64 = 51;
const SUB_TYPE_QUOTED_REPLY: i64 = 57;

/// Normalizes app messages into per-sub-type text templates.
pub struct OtherAppNormalizer;

fn title_of(body: &str) -> String {
    tag_text(body, "title").unwrap_or_default()
}

/// Compose the quoted part of a quoted-reply message.
///
/// Three shapes: a quoted image (size reported when the markup carries a
/// length), a quoted app message whose content is nested XML with its own
/// title, or plain quoted text.
fn compose_quoted(quoted: &str) -> String {
    if quoted.contains("<img") {
        match attr(quoted, "length").and_then(|l| l.parse::<u64>().ok()) {
            Some(len) => format!("[image, {len} bytes]"),
            None => "[image]".to_string(),
        }
    } else if quoted.contains("<msg") || quoted.contains("<appmsg") {
        let nested = title_of(quoted);
        if nested.is_empty() {
            "[app message]".to_string()
        } else {
            nested
        }
    } else {
        quoted.to_string()
    }
}

fn compose(sub_type: i64, body: &str) -> String {
    match sub_type {
        SUB_TYPE_AUDIO => "[audio message]".to_string(),
        SUB_TYPE_CHAT_LOG => format!("[chat log] {}", title_of(body)),
        SUB_TYPE_CLOUD_FILE => format!("[file] {}", title_of(body)),
        SUB_TYPE_SHORT_VIDEO => format!("[video feed] {}", title_of(body)),
        SUB_TYPE_QUOTED_REPLY => {
            let reply = title_of(body);
            let quoted = tag_text(body, "refermsg")
                .map(|refer| {
                    let content = tag_text(&refer, "content").unwrap_or(refer);
                    compose_quoted(&content)
                })
                .unwrap_or_default();
            if quoted.is_empty() {
                reply
            } else {
                format!("{reply}\n> {quoted}")
            }
        }
        other => format!("[app message, sub-type {other}]"),
    }
}

#[async_trait]
impl Handler for OtherAppNormalizer {
    fn name(&self) -> &'static str {
        "normalize_other_app"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::OtherAppReceived {
            return next.run(ctx).await;
        }
        ctx.normalize_to_text(compose(ctx.payload.wx_sub_type, &ctx.payload.msg));
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_templates() {
        assert_eq!(compose(34, "<msg/>"), "[audio message]");
        assert_eq!(
            compose(19, "<msg><title>Group chat history</title></msg>"),
            "[chat log] Group chat history"
        );
        assert_eq!(
            compose(6, "<msg><title>report.pdf</title></msg>"),
            "[file] report.pdf"
        );
        assert_eq!(
            compose(51, "<msg><title>cat video</title></msg>"),
            "[video feed] cat video"
        );
    }

    #[test]
    fn unknown_sub_type_default_template() {
        assert_eq!(compose(99, "<msg/>"), "[app message, sub-type 99]");
    }

    #[test]
    fn quoted_plain_text() {
        let body = "<msg><appmsg><title>agreed!</title>\
            <refermsg><content>see you at 5</content></refermsg></appmsg></msg>";
        assert_eq!(compose(57, body), "agreed!\n> see you at 5");
    }

    #[test]
    fn quoted_image_with_size() {
        let body = "<msg><appmsg><title>nice</title>\
            <refermsg><content><![CDATA[<msg><img length=\"20480\"/></msg>]]></content>\
            </refermsg></appmsg></msg>";
        assert_eq!(compose(57, body), "nice\n> [image, 20480 bytes]");
    }

    #[test]
    fn quoted_nested_xml_title() {
        let body = "<msg><appmsg><title>look</title>\
            <refermsg><content><![CDATA[<msg><appmsg><title>An Article</title></appmsg></msg>]]>\
            </content></refermsg></appmsg></msg>";
        assert_eq!(compose(57, body), "look\n> An Article");
    }

    #[test]
    fn quoted_reply_without_refermsg_is_just_the_reply() {
        let body = "<msg><appmsg><title>hello</title></appmsg></msg>";
        assert_eq!(compose(57, body), "hello");
    }
}
