// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Type normalizers: one handler per inbound kind, each idempotent,
//! rewriting the event to canonical text.
//!
//! Normalizers run at the front of the Message stage, ahead of the command
//! router and the keyword handlers, so that everything downstream consumes
//! one uniform text shape. Malformed markup degrades to a placeholder body
//! and a logged parse failure; the pipeline never aborts over it. Unknown
//! kinds match no normalizer and pass through untouched.

pub mod emoji;
pub mod link;
pub mod location;
pub mod markup;
pub mod other_app;
pub mod payment;
pub mod system;
pub mod voice;

pub use emoji::EmojiNormalizer;
pub use link::{LinkNormalizer, is_group_invite};
pub use location::LocationNormalizer;
pub use other_app::OtherAppNormalizer;
pub use payment::PaymentNormalizer;
pub use system::{MembershipChange, SystemNoticeNormalizer, classify_membership};
pub use voice::{VOICE_CACHE_TTL, VoiceNormalizer, VoiceTranscriptNormalizer};
