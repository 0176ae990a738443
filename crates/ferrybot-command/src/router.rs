// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command router handler.
//!
//! Built-ins run regardless of an earlier claim; mutating commands follow
//! the processed-flag convention and also pass an authorization gate:
//! settings can only be changed from the bot's own identity. An ordinary
//! sender issuing a setting command in a room gets a hint instead of a
//! mutation. Validation failures echo the offending input; nothing is
//! silently defaulted.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use ferrybot_core::traits::AgentClient;
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use ferrybot_settings::{Scope, SettingKey, SettingsService};
use ferrybot_subscribe::{DailySchedule, SubscribeService, parse_daily};
use strum::IntoEnumIterator;
use tracing::{info, warn};

use crate::parse::{BOOL_VOCABULARY, Command, parse_bool, parse_command};

/// Schedule used when `/subscribe` is given without a cron expression.
const DEFAULT_SCHEDULE: DailySchedule = DailySchedule { minute: 0, hour: 8 };

const HELP_TEXT: &str = "commands:\n\
    /set <key> <value> (alias /config) - change a setting\n\
    /set timezone <±HH> - set the room's UTC offset\n\
    /subscribe <keyword> [m h * * *] - daily keyword subscription\n\
    /unsubscribe <keyword>\n\
    /list subscriptions\n\
    /check online\n\
    /sync contacts\n\
    whoami\n\
    /help";

/// Parse a `±HH` whole-hour offset with HH in 0..=12, implicit `+`.
fn parse_timezone(value: &str) -> Result<i32, String> {
    let (sign, digits) = match value.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, value.strip_prefix('+').unwrap_or(value)),
    };
    digits
        .parse::<i32>()
        .ok()
        .filter(|h| (0..=12).contains(h))
        .map(|h| sign * h)
        .ok_or_else(|| format!("invalid timezone \"{value}\"; expected ±HH with HH in 0..=12"))
}

/// Message-stage handler for slash commands and built-ins.
pub struct CommandRouter {
    settings: SettingsService,
    subscriptions: SubscribeService,
    agent: Arc<dyn AgentClient>,
}

impl CommandRouter {
    pub fn new(
        settings: SettingsService,
        subscriptions: SubscribeService,
        agent: Arc<dyn AgentClient>,
    ) -> Self {
        Self {
            settings,
            subscriptions,
            agent,
        }
    }

    async fn reply(&self, ctx: &mut EventContext, body: &str) -> Result<(), FerrybotError> {
        self.agent
            .send_text(&ctx.bot, ctx.reply_target(), body)
            .await?;
        ctx.replied = true;
        Ok(())
    }

    async fn run_builtin(
        &self,
        ctx: &mut EventContext,
        command: &Command,
    ) -> Result<(), FerrybotError> {
        match command {
            Command::Help => self.reply(ctx, HELP_TEXT).await,
            Command::WhoAmI => {
                let body = format!("bot: {} ({})", ctx.bot.name, ctx.bot.wxid);
                self.reply(ctx, &body).await
            }
            Command::CheckOnline => {
                let online = self.agent.check_online(&ctx.bot).await?;
                self.reply(ctx, if online { "agent online" } else { "agent offline" })
                    .await
            }
            Command::SyncContacts => {
                self.agent.sync_contacts(&ctx.bot).await?;
                self.reply(ctx, "contact sync requested").await
            }
            Command::ListSubscriptions => {
                let subscriber = ctx.reply_target().to_string();
                let subs = self.subscriptions.list(ctx.bot.id, &subscriber).await?;
                let body = if subs.is_empty() {
                    "no subscriptions".to_string()
                } else {
                    subs.iter()
                        .map(|s| format!("{} ({})", s.keyword, s.cron_expression()))
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                self.reply(ctx, &body).await
            }
            _ => Ok(()),
        }
    }

    async fn run_set(
        &self,
        ctx: &mut EventContext,
        key: &str,
        value: &str,
    ) -> Result<(), FerrybotError> {
        if !ctx.is_from_bot_self {
            warn!(sender = %ctx.sender, key, "setting command from ordinary sender");
            return self
                .reply(ctx, "settings can only be changed using the bot identity")
                .await;
        }

        if key == "timezone" {
            return self.run_set_timezone(ctx, value).await;
        }

        let Ok(setting) = SettingKey::from_str(key) else {
            let known = SettingKey::iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let body = format!("unknown setting \"{key}\"; known settings: {known}, timezone");
            return self.reply(ctx, &body).await;
        };
        let Some(flag) = parse_bool(value) else {
            let body = format!("invalid value \"{value}\"; accepted: {BOOL_VOCABULARY}");
            return self.reply(ctx, &body).await;
        };

        let (scope, scope_label) = if ctx.is_room_message() {
            (Scope::Room(ctx.room_id.clone()), "this room")
        } else {
            (Scope::Global, "global")
        };
        let context_room = (!ctx.room_id.is_empty()).then(|| ctx.room_id.clone());
        let outcome = self
            .settings
            .set(ctx.bot.id, setting, scope, context_room.as_deref(), flag)
            .await?;
        info!(key = setting.as_str(), value = flag, scope = scope_label, "setting changed");

        let mut body = format!("{} set to {} ({})", setting.as_str(), flag, scope_label);
        if outcome.auto_provisioned_room.is_some() {
            body.push_str("; room messaging auto-enabled as a prerequisite");
        }
        self.reply(ctx, &body).await
    }

    async fn run_set_timezone(
        &self,
        ctx: &mut EventContext,
        value: &str,
    ) -> Result<(), FerrybotError> {
        if !ctx.is_room_message() {
            return self
                .reply(ctx, "timezone is room-scoped; run this inside a room")
                .await;
        }
        match parse_timezone(value) {
            Ok(offset) => {
                self.settings
                    .set_room_utc_offset(ctx.bot.id, &ctx.room_id, offset)
                    .await?;
                let body = format!("timezone set to UTC{offset:+} for this room");
                self.reply(ctx, &body).await
            }
            Err(reason) => self.reply(ctx, &reason).await,
        }
    }

    async fn run_subscribe(
        &self,
        ctx: &mut EventContext,
        keyword: &str,
        cron: Option<&str>,
    ) -> Result<(), FerrybotError> {
        let schedule = match cron {
            Some(expr) => match parse_daily(expr) {
                Ok(schedule) => schedule,
                Err(e) => return self.reply(ctx, &e.to_string()).await,
            },
            None => DEFAULT_SCHEDULE,
        };
        let subscriber = ctx.reply_target().to_string();
        let outcome = self
            .subscriptions
            .create_or_restore(ctx.bot.id, &subscriber, keyword, schedule)
            .await?;
        let body = if outcome.created {
            format!(
                "subscribed to \"{keyword}\" ({})",
                outcome.record.cron_expression()
            )
        } else {
            format!(
                "subscription to \"{keyword}\" restored ({})",
                outcome.record.cron_expression()
            )
        };
        self.reply(ctx, &body).await
    }

    async fn run_unsubscribe(
        &self,
        ctx: &mut EventContext,
        keyword: &str,
    ) -> Result<(), FerrybotError> {
        let subscriber = ctx.reply_target().to_string();
        let body = if self
            .subscriptions
            .cancel(ctx.bot.id, &subscriber, keyword)
            .await?
        {
            format!("unsubscribed from \"{keyword}\"")
        } else {
            "no such subscription".to_string()
        };
        self.reply(ctx, &body).await
    }
}

#[async_trait]
impl Handler for CommandRouter {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::TextReceived {
            return next.run(ctx).await;
        }
        let Some(command) = parse_command(ctx.text()) else {
            return next.run(ctx).await;
        };

        let builtin = matches!(
            command,
            Command::Help
                | Command::WhoAmI
                | Command::CheckOnline
                | Command::SyncContacts
                | Command::ListSubscriptions
        );
        // Built-ins bypass the processed flag; everything else honors it.
        if !builtin && ctx.is_claimed() {
            return next.run(ctx).await;
        }

        match &command {
            Command::Help
            | Command::WhoAmI
            | Command::CheckOnline
            | Command::SyncContacts
            | Command::ListSubscriptions => self.run_builtin(ctx, &command).await?,
            Command::Set { key, value } => self.run_set(ctx, key, value).await?,
            Command::Subscribe { keyword, cron } => {
                self.run_subscribe(ctx, keyword, cron.as_deref()).await?
            }
            Command::Unsubscribe { keyword } => self.run_unsubscribe(ctx, keyword).await?,
            Command::Malformed { reason } => self.reply(ctx, reason).await?,
        }

        ctx.claim(self.name());
        Ok(())
    }
}
