// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signed webhook forwarding.
//!
//! Each bot may configure one webhook URL; canonical text events are
//! POSTed there as JSON. When a secret is configured the body is signed
//! with HMAC-SHA256 and the hex digest travels in `X-Webhook-Signature`.
//! Delivery failures (non-2xx, timeout) are logged and never affect the
//! inbound path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use ferrybot_storage::queries::{bots, contacts};
use ferrybot_storage::Database;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// The forwarded event body.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub msgid: u64,
    /// Original inbound kind, not the normalized one.
    #[serde(rename = "type")]
    pub kind: String,
    /// Conversation peer: the room for room traffic, else the sender.
    pub wxid: String,
    pub remark: String,
    pub avatar: String,
    pub content: String,
    pub timestamp: i64,
    pub bot_wxid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_remark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_wxid: Option<String>,
}

/// Hex HMAC-SHA256 of `body` under `secret`, header-formatted.
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts any key length.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// HTTP delivery of webhook payloads.
pub struct WebhookSender {
    client: reqwest::Client,
    timeout: Duration,
    user_agent: String,
}

impl WebhookSender {
    pub fn new(timeout: Duration, user_agent: String) -> Result<Self, FerrybotError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FerrybotError::Delivery {
                message: "webhook client construction failed".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            timeout,
            user_agent,
        })
    }

    /// POST the payload, signing when a secret is configured.
    pub async fn deliver(
        &self,
        url: &str,
        secret: &str,
        payload: &WebhookPayload,
    ) -> Result<(), FerrybotError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| FerrybotError::Internal(format!("webhook serialize: {e}")))?;

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("User-Agent", &self.user_agent)
            .timeout(self.timeout);
        if !secret.is_empty() {
            request = request.header(SIGNATURE_HEADER, sign(secret, &body));
        }

        let response = request.body(body).send().await.map_err(|e| {
            if e.is_timeout() {
                FerrybotError::Timeout {
                    duration: self.timeout,
                }
            } else {
                FerrybotError::Delivery {
                    message: format!("webhook POST to {url} failed"),
                    source: Some(Box::new(e)),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FerrybotError::Delivery {
                message: format!("webhook POST to {url} returned {status}: {body}"),
                source: None,
            });
        }
        Ok(())
    }
}

/// Message-stage handler forwarding canonical text events per bot config.
pub struct WebhookForwardHandler {
    db: Database,
    sender: Arc<WebhookSender>,
}

impl WebhookForwardHandler {
    pub fn new(db: Database, sender: Arc<WebhookSender>) -> Self {
        Self { db, sender }
    }

    async fn build_payload(&self, ctx: &EventContext) -> Result<WebhookPayload, FerrybotError> {
        let peer = ctx.reply_target().to_string();
        let contact = contacts::find(&self.db, ctx.bot.id, &peer).await?;
        let (remark, avatar) = contact
            .map(|c| (c.name, c.avatar))
            .unwrap_or_default();

        let in_room = ctx.is_room_message();
        Ok(WebhookPayload {
            msgid: ctx.payload.msgid,
            kind: ctx.original_kind.to_string(),
            wxid: peer,
            remark,
            avatar,
            content: ctx.text().to_string(),
            timestamp: ctx.payload.timestamp,
            bot_wxid: ctx.bot.wxid.clone(),
            from: in_room.then(|| ctx.sender.clone()),
            from_remark: in_room.then(|| ctx.payload.from_remark.clone()),
            room_wxid: in_room.then(|| ctx.room_id.clone()),
        })
    }
}

#[async_trait]
impl Handler for WebhookForwardHandler {
    fn name(&self) -> &'static str {
        "webhook_forward"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::TextReceived || ctx.payload.msgid == 0 {
            return next.run(ctx).await;
        }

        let Some(bot) = bots::by_id(&self.db, ctx.bot.id).await? else {
            return next.run(ctx).await;
        };
        if bot.webhook_url.is_empty() {
            return next.run(ctx).await;
        }

        let payload = self.build_payload(ctx).await?;
        match self
            .sender
            .deliver(&bot.webhook_url, &bot.webhook_secret, &payload)
            .await
        {
            Ok(()) => debug!(msgid = payload.msgid, "webhook delivered"),
            Err(e) => warn!(msgid = payload.msgid, error = %e, "webhook delivery failed"),
        }
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrybot_core::Stage;
    use ferrybot_test_utils::TestHarness;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn forwarder(h: &TestHarness) -> Stage {
        let sender = Arc::new(
            WebhookSender::new(Duration::from_secs(5), "ferrybot-webhook/0.1".into()).unwrap(),
        );
        Stage::new("message")
            .handler(Arc::new(WebhookForwardHandler::new(h.db.clone(), sender)))
    }

    #[test]
    fn signature_is_stable_hex_hmac() {
        let sig = sign("secret", b"{\"a\":1}");
        assert!(sig.starts_with("sha256="));
        assert_eq!(sig.len(), "sha256=".len() + 64);
        // Same input, same signature.
        assert_eq!(sig, sign("secret", b"{\"a\":1}"));
        assert_ne!(sig, sign("other", b"{\"a\":1}"));
    }

    #[tokio::test]
    async fn forwards_signed_payload() {
        let h = TestHarness::new().await.unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("Content-Type", "application/json"))
            .and(header("User-Agent", "ferrybot-webhook/0.1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        bots::set_webhook(&h.db, h.bot.id, &format!("{}/hook", server.uri()), "s3cret")
            .await
            .unwrap();

        let mut ctx = h.text_context("user_1", "room_a", "hello hook");
        forwarder(&h).run(&mut ctx).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        let sig = req.headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap();
        assert_eq!(sig, sign("s3cret", &req.body));

        let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
        assert_eq!(body["type"], "MT_RECV_TEXT_MSG");
        assert_eq!(body["wxid"], "room_a");
        assert_eq!(body["from"], "user_1");
        assert_eq!(body["room_wxid"], "room_a");
        assert_eq!(body["content"], "hello hook");
        assert_eq!(body["bot_wxid"], "bot_self_wxid");
    }

    #[tokio::test]
    async fn direct_message_omits_room_fields() {
        let h = TestHarness::new().await.unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        bots::set_webhook(&h.db, h.bot.id, &server.uri(), "")
            .await
            .unwrap();

        let mut ctx = h.text_context("user_1", "", "dm");
        forwarder(&h).run(&mut ctx).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let req = &requests[0];
        // Unsigned delivery has no signature header.
        assert!(req.headers.get(SIGNATURE_HEADER).is_none());
        let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
        assert_eq!(body["wxid"], "user_1");
        assert!(body.get("from").is_none());
        assert!(body.get("room_wxid").is_none());
    }

    #[tokio::test]
    async fn delivery_failure_does_not_stop_the_stage() {
        let h = TestHarness::new().await.unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        bots::set_webhook(&h.db, h.bot.id, &server.uri(), "")
            .await
            .unwrap();

        let mut ctx = h.text_context("user_1", "", "boom");
        // The handler swallows the failure; the stage still completes.
        forwarder(&h).run(&mut ctx).await.unwrap();
        assert!(!ctx.is_claimed());
    }

    #[tokio::test]
    async fn unconfigured_bot_is_skipped() {
        let h = TestHarness::new().await.unwrap();
        let mut ctx = h.text_context("user_1", "", "no hook");
        forwarder(&h).run(&mut ctx).await.unwrap();
        assert!(!ctx.is_claimed());
    }
}
