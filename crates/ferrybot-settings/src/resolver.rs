// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The cascade resolution rule.
//!
//! A single rule covers both override styles: when the global value is
//! false, per-room overrides act as a whitelist (rooms opt in); when it is
//! true, they act as a blacklist (rooms opt out). Callers must not
//! special-case beyond this function.

/// Effective value of a setting given its global value and an optional
/// per-room override. `None` means "inherit from global".
pub fn resolve(global: bool, room_override: Option<bool>) -> bool {
    room_override.unwrap_or(global)
}
