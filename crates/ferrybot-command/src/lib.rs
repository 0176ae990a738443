// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash-command router: grammar, authorization, and setting mutations.

pub mod parse;
pub mod router;

pub use parse::{BOOL_VOCABULARY, Command, parse_bool, parse_command};
pub use router::CommandRouter;
