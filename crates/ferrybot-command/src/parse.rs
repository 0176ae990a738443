// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command grammar: `/set` (alias `/config`) plus fixed built-ins.
//!
//! Parsing is syntax only; authorization and value validation happen in the
//! router. Anything that is not a command at all returns `None` so the text
//! falls through to the keyword handlers.

/// A recognized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/help`
    Help,
    /// `whoami` or `/whoami`
    WhoAmI,
    /// `/check online`
    CheckOnline,
    /// `/sync contacts`
    SyncContacts,
    /// `/list subscriptions`
    ListSubscriptions,
    /// `/set <key> <value>` or `/config <key> <value>`
    Set { key: String, value: String },
    /// `/subscribe <keyword> [cron]`
    Subscribe { keyword: String, cron: Option<String> },
    /// `/unsubscribe <keyword>`
    Unsubscribe { keyword: String },
    /// A command-shaped line with wrong arity; the reason is user-visible.
    Malformed { reason: String },
}

/// The accepted boolean vocabulary, for error messages.
pub const BOOL_VOCABULARY: &str = "1/0, on/off, true/false, yes/no, enable/disable";

/// Parse a boolean from the fixed vocabulary, case-insensitively.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "on" | "true" | "yes" | "enable" => Some(true),
        "0" | "off" | "false" | "no" | "disable" => Some(false),
        _ => None,
    }
}

/// Recognize a command line, or `None` for ordinary text.
pub fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    match trimmed {
        "/help" => return Some(Command::Help),
        "whoami" | "/whoami" => return Some(Command::WhoAmI),
        "/check online" => return Some(Command::CheckOnline),
        "/sync contacts" => return Some(Command::SyncContacts),
        "/list subscriptions" => return Some(Command::ListSubscriptions),
        _ => {}
    }

    let mut words = trimmed.split_whitespace();
    let head = words.next()?;
    match head {
        "/set" | "/config" => {
            let key = words.next();
            let value = words.next();
            match (key, value, words.next()) {
                (Some(key), Some(value), None) => Some(Command::Set {
                    key: key.to_string(),
                    value: value.to_string(),
                }),
                _ => Some(Command::Malformed {
                    reason: format!("usage: {head} <key> <value>"),
                }),
            }
        }
        "/subscribe" => {
            let keyword = words.next();
            let cron: Vec<&str> = words.collect();
            match keyword {
                Some(keyword) => Some(Command::Subscribe {
                    keyword: keyword.to_string(),
                    cron: (!cron.is_empty()).then(|| cron.join(" ")),
                }),
                None => Some(Command::Malformed {
                    reason: "usage: /subscribe <keyword> [cron]".to_string(),
                }),
            }
        }
        "/unsubscribe" => match (words.next(), words.next()) {
            (Some(keyword), None) => Some(Command::Unsubscribe {
                keyword: keyword.to_string(),
            }),
            _ => Some(Command::Malformed {
                reason: "usage: /unsubscribe <keyword>".to_string(),
            }),
        },
        _ => None,
    }
}
