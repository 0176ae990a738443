// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tolerant extraction helpers for the agent's XML-ish message markup.
//!
//! The agent embeds loosely-formed XML fragments in message bodies. These
//! helpers scan for attributes and tags by name without requiring the
//! fragment to be well-formed; a missing or mangled field is `None`, never
//! an error. CDATA wrappers are stripped transparently.

/// Value of the first `name="..."` attribute occurrence.
pub fn attr(body: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let start = body.find(&needle)? + needle.len();
    let rest = &body[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Inner text of the first `<tag>...</tag>` pair, CDATA unwrapped.
///
/// Matches both `<tag>` and `<tag attr="...">` openings. Returns `None` for
/// self-closing or unterminated tags.
pub fn tag_text(body: &str, tag: &str) -> Option<String> {
    let open_plain = format!("<{tag}>");
    let open_attrs = format!("<{tag} ");
    let close = format!("</{tag}>");

    let content_start = if let Some(pos) = body.find(&open_plain) {
        pos + open_plain.len()
    } else {
        let pos = body.find(&open_attrs)?;
        let rest = &body[pos..];
        let gt = rest.find('>')?;
        if rest[..gt].ends_with('/') {
            return None;
        }
        pos + gt + 1
    };
    let rest = &body[content_start..];
    let content_end = rest.find(&close)?;
    Some(strip_cdata(&rest[..content_end]).to_string())
}

/// Remove one `<![CDATA[...]]>` wrapper, if present.
pub fn strip_cdata(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .unwrap_or(trimmed)
}

/// Strip one pair of wrapping straight or curly quotes.
pub fn strip_wrapping_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for (open, close) in [('"', '"'), ('“', '”'), ('「', '」')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|t| t.strip_suffix(close))
        {
            return inner;
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_extracts_first_occurrence() {
        let body = r#"<emoji cdnurl="https://cdn/x" width="240" height="240" len="102400"/>"#;
        assert_eq!(attr(body, "cdnurl").as_deref(), Some("https://cdn/x"));
        assert_eq!(attr(body, "width").as_deref(), Some("240"));
        assert_eq!(attr(body, "missing"), None);
    }

    #[test]
    fn attr_tolerates_unterminated_value() {
        assert_eq!(attr(r#"<emoji cdnurl="https://cdn"#, "cdnurl"), None);
    }

    #[test]
    fn tag_text_handles_plain_and_cdata() {
        let body = "<msg><title>hello</title><url><![CDATA[https://a/b?x=1&y=2]]></url></msg>";
        assert_eq!(tag_text(body, "title").as_deref(), Some("hello"));
        assert_eq!(tag_text(body, "url").as_deref(), Some("https://a/b?x=1&y=2"));
        assert_eq!(tag_text(body, "des"), None);
    }

    #[test]
    fn tag_text_handles_attributed_opening() {
        let body = r#"<appmsg appid="" sdkver="0"><title>t</title></appmsg>"#;
        assert_eq!(tag_text(body, "appmsg").as_deref(), Some(r#"<title>t</title>"#));
    }

    #[test]
    fn tag_text_skips_self_closing() {
        assert_eq!(tag_text(r#"<thumb url="x"/>"#, "thumb"), None);
    }

    #[test]
    fn wrapping_quotes_stripped_once() {
        assert_eq!(strip_wrapping_quotes(r#""hello""#), "hello");
        assert_eq!(strip_wrapping_quotes("“你好”"), "你好");
        assert_eq!(strip_wrapping_quotes("plain"), "plain");
        assert_eq!(strip_wrapping_quotes(r#""a" and "b""#), r#"a" and "b"#);
    }
}
