// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings service: persistence-backed cascade resolution plus the
//! check-in permission cascade and its auto-provision side effect.

use ferrybot_core::FerrybotError;
use ferrybot_storage::Database;
use ferrybot_storage::queries::settings as q;
use tracing::info;

use crate::resolver::resolve;
use crate::{Scope, SettingKey};

/// Default UTC offset for rooms with no configured timezone.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// Outcome of a setting mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetOutcome {
    /// Room that had room-messaging auto-enabled as a prerequisite of
    /// check-in, if the mutation triggered that side effect.
    pub auto_provisioned_room: Option<String>,
}

/// Persistence-backed settings for one gateway process.
#[derive(Clone)]
pub struct SettingsService {
    db: Database,
}

impl SettingsService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Global value of a setting, falling back to the key's built-in default
    /// when no row was ever written.
    pub async fn global(&self, bot_id: i64, key: SettingKey) -> Result<bool, FerrybotError> {
        let stored = q::global(&self.db, bot_id, key.as_str()).await?;
        Ok(stored.unwrap_or(key.default_value()))
    }

    /// Per-room override, `None` meaning inherit.
    pub async fn room_override(
        &self,
        bot_id: i64,
        key: SettingKey,
        room: &str,
    ) -> Result<Option<bool>, FerrybotError> {
        q::room_override(&self.db, bot_id, key.as_str(), room).await
    }

    /// Effective value for a scope: the room override when present, else
    /// the global value. A `None` room is plain global resolution.
    pub async fn effective(
        &self,
        bot_id: i64,
        key: SettingKey,
        room: Option<&str>,
    ) -> Result<bool, FerrybotError> {
        let global = self.global(bot_id, key).await?;
        let room_override = match room {
            Some(room) if !room.is_empty() => {
                q::room_override(&self.db, bot_id, key.as_str(), room).await?
            }
            _ => None,
        };
        Ok(resolve(global, room_override))
    }

    /// Effective check-in permission for a room.
    ///
    /// Room-messaging is the prerequisite and is evaluated first; when it
    /// resolves false the check-in override map is not consulted at all.
    pub async fn check_in_permitted(
        &self,
        bot_id: i64,
        room: &str,
    ) -> Result<bool, FerrybotError> {
        if !self
            .effective(bot_id, SettingKey::RoomMessages, Some(room))
            .await?
        {
            return Ok(false);
        }
        self.effective(bot_id, SettingKey::CheckIn, Some(room)).await
    }

    /// Apply a setting mutation at the given scope.
    ///
    /// `context_room` is the room the command was issued in (if any); it is
    /// the target of the check-in auto-provision side effect even when the
    /// mutation itself is global.
    pub async fn set(
        &self,
        bot_id: i64,
        key: SettingKey,
        scope: Scope,
        context_room: Option<&str>,
        value: bool,
    ) -> Result<SetOutcome, FerrybotError> {
        match &scope {
            Scope::Global => q::set_global(&self.db, bot_id, key.as_str(), value).await?,
            Scope::Room(room) => {
                q::set_room_override(&self.db, bot_id, key.as_str(), room, value).await?
            }
        }
        info!(bot_id, key = key.as_str(), ?scope, value, "setting updated");

        let mut outcome = SetOutcome::default();
        if key == SettingKey::CheckIn && value {
            let room = match (&scope, context_room) {
                (Scope::Room(room), _) => Some(room.clone()),
                (Scope::Global, Some(room)) if !room.is_empty() => Some(room.to_string()),
                _ => None,
            };
            if let Some(room) = room
                && self.auto_provision_room_messages(bot_id, &room).await?
            {
                outcome.auto_provisioned_room = Some(room);
            }
        }
        Ok(outcome)
    }

    /// All overrides for one setting, for diagnostics.
    pub async fn overrides_for(
        &self,
        bot_id: i64,
        key: SettingKey,
    ) -> Result<Vec<(String, bool)>, FerrybotError> {
        q::overrides_for(&self.db, bot_id, key.as_str()).await
    }

    /// UTC offset of a room in whole hours, defaulting to +8.
    pub async fn room_utc_offset(
        &self,
        bot_id: i64,
        room: &str,
    ) -> Result<i32, FerrybotError> {
        let stored = q::room_timezone(&self.db, bot_id, room).await?;
        Ok(stored.unwrap_or(DEFAULT_UTC_OFFSET_HOURS))
    }

    /// Set a room's UTC offset. Range checking happens at the command layer.
    pub async fn set_room_utc_offset(
        &self,
        bot_id: i64,
        room: &str,
        offset_hours: i32,
    ) -> Result<(), FerrybotError> {
        q::set_room_timezone(&self.db, bot_id, room, offset_hours).await
    }

    /// Enable room-messaging for `room` iff it currently resolves false and
    /// has no explicit override there. Returns whether a row was written.
    ///
    /// An existing override is never overwritten, and nothing happens when
    /// room-messaging is already true by any path.
    async fn auto_provision_room_messages(
        &self,
        bot_id: i64,
        room: &str,
    ) -> Result<bool, FerrybotError> {
        let key = SettingKey::RoomMessages;
        let existing = q::room_override(&self.db, bot_id, key.as_str(), room).await?;
        if existing.is_some() {
            return Ok(false);
        }
        if self.global(bot_id, key).await? {
            return Ok(false);
        }
        q::set_room_override(&self.db, bot_id, key.as_str(), room, true).await?;
        info!(bot_id, room, "auto-enabled room messaging as check-in prerequisite");
        Ok(true)
    }
}
