// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! State-stage handler for agent lifecycle events.
//!
//! Login and logout are bookkeeping-only: the event is logged against the
//! bot and claimed so the rest of the State stage is skipped. Message
//! stages still run (the runner resets the short-circuit per stage) but
//! their handlers ignore non-message kinds.

use async_trait::async_trait;
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
struct LoginData {
    #[serde(default)]
    wxid: String,
    #[serde(default, alias = "nickname")]
    name: String,
}

/// Logs agent login/logout transitions.
pub struct SessionStateHandler;

#[async_trait]
impl Handler for SessionStateHandler {
    fn name(&self) -> &'static str {
        "session_state"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        match ctx.message_kind {
            EventKind::UserLogin => {
                let data: LoginData =
                    serde_json::from_value(ctx.raw.data.clone()).unwrap_or_default();
                info!(
                    bot = %ctx.bot.wxid,
                    account = %data.wxid,
                    name = %data.name,
                    "agent logged in"
                );
                ctx.claim(self.name());
                Ok(())
            }
            EventKind::UserLogout => {
                info!(bot = %ctx.bot.wxid, "agent logged out");
                ctx.claim(self.name());
                Ok(())
            }
            _ => next.run(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrybot_core::{AgentEvent, BotIdentity, Stage};
    use serde_json::json;
    use std::sync::Arc;

    fn ctx(kind: &str, data: serde_json::Value) -> EventContext {
        EventContext::new(
            AgentEvent {
                kind: kind.into(),
                client_id: 1,
                data,
            },
            BotIdentity {
                id: 1,
                wxid: "bot_1".into(),
                name: "ferry".into(),
            },
        )
    }

    #[tokio::test]
    async fn login_claims_the_stage() {
        let stage = Stage::new("state").handler(Arc::new(SessionStateHandler));
        let mut ctx = ctx("MT_USER_LOGIN", json!({"wxid": "bot_1", "nickname": "Ferry"}));
        stage.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.processed_by, vec!["session_state"]);
    }

    #[tokio::test]
    async fn text_passes_through() {
        let stage = Stage::new("state").handler(Arc::new(SessionStateHandler));
        let mut ctx = ctx("MT_RECV_TEXT_MSG", json!({"from_wxid": "u", "msg": "hi"}));
        stage.run(&mut ctx).await.unwrap();
        assert!(!ctx.is_claimed());
    }
}
