// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration cascade for bot settings.
//!
//! Every setting is a boolean with a global value per bot and optional
//! per-room overrides. The cascade rule lives in [`resolver::resolve`]; the
//! [`SettingsService`] adds persistence, the check-in permission cascade,
//! and the room-messaging auto-provision side effect.

pub mod resolver;
pub mod service;

use strum::{Display, EnumIter, EnumString};

pub use resolver::resolve;
pub use service::{DEFAULT_UTC_OFFSET_HOURS, SetOutcome, SettingsService};

/// The closed set of bot settings the command router can mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum SettingKey {
    /// Process messages sent inside rooms at all.
    RoomMessages,
    /// Daily check-in bookkeeping (requires `RoomMessages`).
    CheckIn,
    /// Keyword-triggered resource replies.
    KeywordResources,
    /// Mirror keyword hits to the support desk.
    KeywordSync,
    /// Automatic payment accept/refund handling.
    PaymentAuto,
    /// Mirror conversations to the support desk.
    DeskSync,
}

impl SettingKey {
    /// Stable storage/wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoomMessages => "room_messages",
            Self::CheckIn => "check_in",
            Self::KeywordResources => "keyword_resources",
            Self::KeywordSync => "keyword_sync",
            Self::PaymentAuto => "payment_auto",
            Self::DeskSync => "desk_sync",
        }
    }

    /// Value assumed when a bot has never written the global row.
    ///
    /// Conservative keys (room processing, desk mirroring) start off;
    /// reply-style features start on.
    pub fn default_value(&self) -> bool {
        match self {
            Self::RoomMessages | Self::KeywordSync | Self::DeskSync => false,
            Self::CheckIn | Self::KeywordResources | Self::PaymentAuto => true,
        }
    }
}

/// Where a setting mutation lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global,
    Room(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn key_names_round_trip() {
        for key in SettingKey::iter() {
            let parsed = SettingKey::from_str(key.as_str()).unwrap();
            assert_eq!(parsed, key);
            assert_eq!(key.to_string(), key.as_str());
        }
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(SettingKey::from_str("timezone").is_err());
        assert!(SettingKey::from_str("CHECK_IN").is_err());
    }
}
