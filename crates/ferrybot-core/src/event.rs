// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event wire shape and the per-event [`EventContext`] aggregate.
//!
//! The agent posts `{type, client_id, data}` envelopes. The gateway derives
//! sender/room/privilege fields exactly once at context construction; type
//! normalizers later rewrite `message_kind` to [`EventKind::TextReceived`]
//! while `original_kind` keeps the inbound kind for audit.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Canonical event kinds emitted by the IM-automation agent.
///
/// Wire strings follow the agent's `MT_*` vocabulary. Kinds the gateway does
/// not recognize parse into [`EventKind::Unknown`] and pass through the
/// pipeline untouched.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
pub enum EventKind {
    #[strum(serialize = "MT_RECV_TEXT_MSG")]
    TextReceived,
    #[strum(serialize = "MT_RECV_EMOJI_MSG")]
    EmojiReceived,
    #[strum(serialize = "MT_RECV_LINK_MSG")]
    LinkReceived,
    #[strum(serialize = "MT_RECV_LOCATION_MSG")]
    LocationReceived,
    #[strum(serialize = "MT_RECV_TRANSFER_MSG")]
    PaymentReceived,
    #[strum(serialize = "MT_RECV_SYSTEM_MSG")]
    SystemNotice,
    #[strum(serialize = "MT_RECV_OTHER_APP_MSG")]
    OtherAppReceived,
    #[strum(serialize = "MT_RECV_VOICE_MSG")]
    VoiceReceived,
    #[strum(serialize = "MT_TRANS_VOICE_MSG")]
    VoiceTranscript,
    #[strum(serialize = "MT_USER_LOGIN")]
    UserLogin,
    #[strum(serialize = "MT_USER_LOGOUT")]
    UserLogout,
    #[strum(serialize = "MT_DATA_FRIENDS_MSG")]
    ContactSync,
    #[strum(serialize = "MT_DATA_CHATROOMS_MSG")]
    RoomSync,
    /// Any kind string the gateway does not model.
    #[strum(default)]
    Unknown(String),
}

/// Raw inbound envelope from the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    /// Wire kind string, e.g. `MT_RECV_TEXT_MSG`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Agent-side client connection identifier.
    #[serde(default)]
    pub client_id: i64,
    /// Kind-specific payload; object, array, or null.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Message-bearing payload fields shared by the `MT_RECV_*` kinds.
///
/// Unknown fields are ignored so the agent can grow its payload without
/// breaking the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub from_wxid: String,
    #[serde(default)]
    pub to_wxid: String,
    /// Empty for direct messages.
    #[serde(default)]
    pub room_wxid: String,
    #[serde(default)]
    pub msgid: u64,
    /// Message body; XML-ish markup for non-text kinds.
    #[serde(default)]
    pub msg: String,
    /// Raw companion markup some kinds carry alongside `msg`.
    #[serde(default)]
    pub raw_msg: String,
    /// Sub-type code for app messages and system notices.
    #[serde(default)]
    pub wx_sub_type: i64,
    /// Type code for app messages.
    #[serde(default)]
    pub wx_type: i64,
    /// Sender display name, when the agent includes it.
    #[serde(default)]
    pub from_remark: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// The bot identity an inbound event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    /// Storage row id.
    pub id: i64,
    /// The bot's own IM account id.
    pub wxid: String,
    /// Display name.
    pub name: String,
}

/// Per-event mutable aggregate threaded through the pipeline.
///
/// Created once per inbound event, never persisted. Derived fields are
/// computed at construction and not re-derived after normalizers mutate the
/// message kind.
#[derive(Debug)]
pub struct EventContext {
    /// The raw inbound envelope, kept for audit and webhook forwarding.
    pub raw: AgentEvent,
    /// Canonical kind; normalizers rewrite this to `TextReceived`.
    pub message_kind: EventKind,
    /// The kind the event arrived with.
    pub original_kind: EventKind,
    /// Parsed message payload (zeroed for non-message kinds).
    pub payload: MessagePayload,
    /// Bot the event was delivered to.
    pub bot: BotIdentity,
    /// Sender account id.
    pub sender: String,
    /// Recipient account id.
    pub recipient: String,
    /// Room id; empty means direct message.
    pub room_id: String,
    /// Sender equals the bot's own identity; drives privilege checks.
    pub is_from_bot_self: bool,
    /// Ordered names of handlers that claimed this event.
    pub processed_by: Vec<&'static str>,
    /// A reply was already sent; prevents duplicate replies downstream.
    pub replied: bool,
    /// Canonical text synthesized by normalizers, consumed downstream.
    pub processed_message: Option<String>,
    /// Transcript text attached by the voice-transcript normalizer.
    pub voice_transcript: Option<String>,
}

impl EventContext {
    /// Build a context from a raw envelope, deriving all fields once.
    pub fn new(raw: AgentEvent, bot: BotIdentity) -> Self {
        let kind: EventKind = raw.kind.parse().unwrap_or_else(|_| {
            // EnumString with a default variant cannot fail, but the parse
            // signature still returns Result.
            EventKind::Unknown(raw.kind.clone())
        });
        let payload: MessagePayload =
            serde_json::from_value(raw.data.clone()).unwrap_or_default();
        let sender = payload.from_wxid.clone();
        let recipient = payload.to_wxid.clone();
        let room_id = payload.room_wxid.clone();
        let is_from_bot_self = !sender.is_empty() && sender == bot.wxid;
        Self {
            raw,
            message_kind: kind.clone(),
            original_kind: kind,
            payload,
            bot,
            sender,
            recipient,
            room_id,
            is_from_bot_self,
            processed_by: Vec::new(),
            replied: false,
            processed_message: None,
            voice_transcript: None,
        }
    }

    /// Whether the event was delivered inside a room.
    pub fn is_room_message(&self) -> bool {
        !self.room_id.is_empty()
    }

    /// Whether any handler has claimed this event.
    pub fn is_claimed(&self) -> bool {
        !self.processed_by.is_empty()
    }

    /// Record `handler` as having claimed the event.
    pub fn claim(&mut self, handler: &'static str) {
        self.processed_by.push(handler);
    }

    /// The reply target: the room for room messages, else the sender.
    pub fn reply_target(&self) -> &str {
        if self.is_room_message() {
            &self.room_id
        } else {
            &self.sender
        }
    }

    /// Canonical text of the event: the normalized body when a normalizer
    /// produced one, otherwise the raw message body.
    pub fn text(&self) -> &str {
        self.processed_message
            .as_deref()
            .unwrap_or(&self.payload.msg)
    }

    /// Rewrite the message kind to text with the given body.
    ///
    /// Idempotent for a given body; the original kind stays available in
    /// [`EventContext::original_kind`].
    pub fn normalize_to_text(&mut self, body: String) {
        self.message_kind = EventKind::TextReceived;
        self.processed_message = Some(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bot() -> BotIdentity {
        BotIdentity {
            id: 1,
            wxid: "bot_1".into(),
            name: "ferry".into(),
        }
    }

    fn text_event(from: &str, room: &str) -> AgentEvent {
        AgentEvent {
            kind: "MT_RECV_TEXT_MSG".into(),
            client_id: 7,
            data: json!({
                "from_wxid": from,
                "to_wxid": "bot_1",
                "room_wxid": room,
                "msgid": 42,
                "msg": "hello",
            }),
        }
    }

    #[test]
    fn kind_parses_known_and_unknown() {
        let known: EventKind = "MT_RECV_EMOJI_MSG".parse().unwrap();
        assert_eq!(known, EventKind::EmojiReceived);

        let unknown: EventKind = "MT_SOMETHING_NEW".parse().unwrap();
        assert_eq!(unknown, EventKind::Unknown("MT_SOMETHING_NEW".into()));
    }

    #[test]
    fn context_derives_fields_once() {
        let ctx = EventContext::new(text_event("user_9", "room_3"), bot());
        assert_eq!(ctx.sender, "user_9");
        assert_eq!(ctx.room_id, "room_3");
        assert!(ctx.is_room_message());
        assert!(!ctx.is_from_bot_self);
        assert_eq!(ctx.reply_target(), "room_3");
        assert_eq!(ctx.text(), "hello");
    }

    #[test]
    fn bot_self_detection() {
        let ctx = EventContext::new(text_event("bot_1", ""), bot());
        assert!(ctx.is_from_bot_self);
        assert!(!ctx.is_room_message());
        assert_eq!(ctx.reply_target(), "bot_1");
    }

    #[test]
    fn normalize_preserves_original_kind() {
        let mut raw = text_event("user_9", "");
        raw.kind = "MT_RECV_EMOJI_MSG".into();
        let mut ctx = EventContext::new(raw, bot());
        ctx.normalize_to_text("[emoji] body".into());
        assert_eq!(ctx.message_kind, EventKind::TextReceived);
        assert_eq!(ctx.original_kind, EventKind::EmojiReceived);
        assert_eq!(ctx.text(), "[emoji] body");
    }

    #[test]
    fn claim_tracking() {
        let mut ctx = EventContext::new(text_event("user_9", ""), bot());
        assert!(!ctx.is_claimed());
        ctx.claim("check_in");
        ctx.claim("keyword");
        assert_eq!(ctx.processed_by, vec!["check_in", "keyword"]);
    }

    #[test]
    fn malformed_data_yields_default_payload() {
        let raw = AgentEvent {
            kind: "MT_RECV_TEXT_MSG".into(),
            client_id: 1,
            data: json!([1, 2, 3]),
        };
        let ctx = EventContext::new(raw, bot());
        assert!(ctx.sender.is_empty());
        assert!(!ctx.is_room_message());
    }
}
