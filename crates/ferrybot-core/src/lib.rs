// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Ferrybot gateway.
//!
//! Defines the inbound event shape, the per-event [`EventContext`]
//! aggregate, the staged handler pipeline, the shared error type, and the
//! collaborator traits every other crate implements or consumes.

pub mod error;
pub mod event;
pub mod pipeline;
pub mod traits;

pub use error::FerrybotError;
pub use event::{AgentEvent, BotIdentity, EventContext, EventKind, MessagePayload};
pub use pipeline::{Handler, Next, PipelineRunner, Stage};
pub use traits::{AgentClient, DeskContact, DeskMessage, DeskSync, KeyValueCache};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _config = FerrybotError::Config("bad".into());
        let _storage = FerrybotError::Storage {
            source: Box::new(std::io::Error::other("disk")),
        };
        let _agent = FerrybotError::Agent {
            message: "send failed".into(),
            source: None,
        };
        let _delivery = FerrybotError::Delivery {
            message: "webhook 500".into(),
            source: None,
        };
        let _unknown = FerrybotError::UnknownBot("tok".into());
        let _timeout = FerrybotError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = FerrybotError::Internal("oops".into());
    }

    #[test]
    fn kind_display_round_trips() {
        use std::str::FromStr;
        let kinds = [
            "MT_RECV_TEXT_MSG",
            "MT_RECV_VOICE_MSG",
            "MT_USER_LOGIN",
            "MT_DATA_FRIENDS_MSG",
        ];
        for wire in kinds {
            let kind = EventKind::from_str(wire).unwrap();
            assert_eq!(kind.to_string(), wire);
        }
    }
}
