// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ferrybot serve` command implementation.
//!
//! Opens storage, builds the outbound clients, assembles the three-stage
//! pipeline, spawns the background workers, and serves the callback
//! endpoint until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferrybot_cache::MemoryCache;
use ferrybot_checkin::{CheckInHandler, CheckInService};
use ferrybot_command::CommandRouter;
use ferrybot_config::FerrybotConfig;
use ferrybot_core::traits::{AgentClient, DeskContact, DeskMessage, DeskSync, KeyValueCache};
use ferrybot_core::{BotIdentity, FerrybotError, PipelineRunner, Stage};
use ferrybot_dispatch::{
    DeskSyncHandler, DeskSyncWorker, HttpAgentClient, HttpDeskSync, KeywordResourceHandler,
    WebhookForwardHandler, WebhookSender,
};
use ferrybot_gateway::{GatewayState, RosterSyncHandler, ServerConfig, SessionStateHandler};
use ferrybot_normalize::{
    EmojiNormalizer, LinkNormalizer, LocationNormalizer, OtherAppNormalizer, PaymentNormalizer,
    SystemNoticeNormalizer, VoiceNormalizer, VoiceTranscriptNormalizer,
};
use ferrybot_settings::{DEFAULT_UTC_OFFSET_HOURS, SettingsService};
use ferrybot_storage::Database;
use ferrybot_subscribe::{SubscribeService, SubscriptionDispatcher};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::shutdown;

/// Stand-in desk target when no desk is configured.
///
/// Mirroring calls become debug-logged no-ops so handlers that mirror
/// contacts do not need to special-case a missing desk.
struct DisabledDeskSync;

#[async_trait]
impl DeskSync for DisabledDeskSync {
    async fn ensure_contact(
        &self,
        _bot: &BotIdentity,
        contact: &DeskContact,
    ) -> Result<(), FerrybotError> {
        debug!(wxid = %contact.wxid, "desk sync disabled, contact not mirrored");
        Ok(())
    }

    async fn sync_message(
        &self,
        _bot: &BotIdentity,
        _message: &DeskMessage,
    ) -> Result<(), FerrybotError> {
        debug!("desk sync disabled, message not mirrored");
        Ok(())
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs the `ferrybot serve` command.
pub async fn run_serve(config: FerrybotConfig) -> Result<(), FerrybotError> {
    init_tracing(&config.server.log_level);
    info!("starting ferrybot serve");

    let db = Database::open(&config.storage.database_path).await?;
    let settings = SettingsService::new(db.clone());
    let cache: Arc<dyn KeyValueCache> = Arc::new(MemoryCache::new());

    let agent: Arc<dyn AgentClient> = Arc::new(HttpAgentClient::new(
        config.agent.base_url.clone(),
        Duration::from_secs(config.agent.request_timeout_secs),
    )?);

    let desk_enabled = !config.delivery.desk_base_url.is_empty();
    let desk: Arc<dyn DeskSync> = if desk_enabled {
        Arc::new(HttpDeskSync::new(
            config.delivery.desk_base_url.clone(),
            config.delivery.desk_api_token.clone(),
            Duration::from_secs(config.delivery.webhook_timeout_secs),
        )?)
    } else {
        Arc::new(DisabledDeskSync)
    };

    let webhook_sender = Arc::new(WebhookSender::new(
        Duration::from_secs(config.delivery.webhook_timeout_secs),
        config.delivery.user_agent.clone(),
    )?);

    let checkins = CheckInService::new(db.clone(), settings.clone());
    let subscriptions = SubscribeService::new(db.clone());

    let runner = Arc::new(PipelineRunner::new(vec![
        Stage::new("state").handler(Arc::new(SessionStateHandler)),
        Stage::new("contact").handler(Arc::new(RosterSyncHandler::new(db.clone()))),
        Stage::new("message")
            .handler(Arc::new(EmojiNormalizer))
            .handler(Arc::new(LinkNormalizer))
            .handler(Arc::new(LocationNormalizer))
            .handler(Arc::new(PaymentNormalizer::new(
                settings.clone(),
                Arc::clone(&agent),
            )))
            .handler(Arc::new(SystemNoticeNormalizer::new(
                db.clone(),
                settings.clone(),
                Arc::clone(&agent),
                Arc::clone(&desk),
            )))
            .handler(Arc::new(OtherAppNormalizer))
            .handler(Arc::new(VoiceNormalizer::new(
                Arc::clone(&agent),
                Arc::clone(&cache),
            )))
            .handler(Arc::new(VoiceTranscriptNormalizer::new(Arc::clone(&cache))))
            .handler(Arc::new(CommandRouter::new(
                settings.clone(),
                subscriptions.clone(),
                Arc::clone(&agent),
            )))
            .handler(Arc::new(CheckInHandler::new(
                checkins,
                settings.clone(),
                Arc::clone(&agent),
            )))
            .handler(Arc::new(KeywordResourceHandler::new(
                db.clone(),
                settings.clone(),
                Arc::clone(&cache),
                Arc::clone(&agent),
            )))
            .handler(Arc::new(DeskSyncHandler::new(db.clone(), settings.clone())))
            .handler(Arc::new(WebhookForwardHandler::new(
                db.clone(),
                Arc::clone(&webhook_sender),
            ))),
    ]));

    let token = shutdown::install_signal_handler();

    // Background workers.
    let dispatcher = SubscriptionDispatcher::new(
        db.clone(),
        Arc::clone(&agent),
        DEFAULT_UTC_OFFSET_HOURS,
    );
    let dispatcher_handle = tokio::spawn(dispatcher.run(token.clone()));

    let worker_handle = if desk_enabled {
        let worker = DeskSyncWorker::new(
            db.clone(),
            Arc::clone(&desk),
            Duration::from_secs(config.delivery.job_poll_secs),
        );
        Some(tokio::spawn(worker.run(token.clone())))
    } else {
        info!("no desk configured, desk sync worker not started");
        None
    };

    let server_config = ServerConfig {
        host: config.server.bind_address.clone(),
        port: config.server.port,
    };
    let state = GatewayState::new(db.clone(), runner);
    let result = ferrybot_gateway::start_server(&server_config, state, token.clone()).await;

    // Server is down; stop workers and close storage.
    token.cancel();
    let _ = dispatcher_handle.await;
    if let Some(handle) = worker_handle {
        let _ = handle.await;
    }
    db.close().await?;
    info!("ferrybot serve stopped");

    result
}
