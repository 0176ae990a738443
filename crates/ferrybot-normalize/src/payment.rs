// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment-transfer normalizer.
//!
//! Parses the nested payment markup, decides accept vs refund, and always
//! converts the event to text afterward so downstream audit (webhook, desk
//! sync) sees the transfer regardless of the outcome.
//!
//! A transfer of exactly 1 minor unit is a probe amount and is refunded
//! instead of accepted. Both actions only fire while the `payment_auto`
//! setting resolves true for the message's scope.

use std::sync::Arc;

use async_trait::async_trait;
use ferrybot_core::traits::AgentClient;
use ferrybot_core::{EventContext, EventKind, FerrybotError, Handler, Next};
use ferrybot_settings::{SettingKey, SettingsService};
use tracing::{info, warn};

use crate::markup::tag_text;

/// The refund-instead-of-accept probe amount, in minor units.
const PROBE_AMOUNT_MINOR: i64 = 1;

#[derive(Debug, PartialEq, Eq)]
struct Transfer {
    transfer_id: String,
    fee_description: String,
    memo: String,
    /// Minor currency units; `None` when the fee text did not parse.
    amount_minor: Option<i64>,
}

fn parse_transfer(body: &str) -> Transfer {
    let fee_description = tag_text(body, "feedesc").unwrap_or_default();
    let amount_minor = fee_description
        .trim()
        .trim_start_matches(['¥', '￥', '$'])
        .parse::<f64>()
        .ok()
        .map(|yuan| (yuan * 100.0).round() as i64);
    Transfer {
        transfer_id: tag_text(body, "transferid").unwrap_or_default(),
        fee_description,
        memo: tag_text(body, "pay_memo").unwrap_or_default(),
        amount_minor,
    }
}

fn compose(transfer: &Transfer) -> String {
    let mut body = format!("[payment] {}", transfer.fee_description.trim());
    if !transfer.memo.is_empty() {
        body.push_str(&format!(" memo: {}", transfer.memo));
    }
    if transfer.fee_description.is_empty() && transfer.memo.is_empty() {
        body = "[payment] transfer received".to_string();
    }
    body
}

/// Normalizes inbound transfers and performs the accept/refund action.
pub struct PaymentNormalizer {
    settings: SettingsService,
    agent: Arc<dyn AgentClient>,
}

impl PaymentNormalizer {
    pub fn new(settings: SettingsService, agent: Arc<dyn AgentClient>) -> Self {
        Self { settings, agent }
    }
}

#[async_trait]
impl Handler for PaymentNormalizer {
    fn name(&self) -> &'static str {
        "normalize_payment"
    }

    async fn handle(
        &self,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<(), FerrybotError> {
        if ctx.message_kind != EventKind::PaymentReceived {
            return next.run(ctx).await;
        }

        let transfer = parse_transfer(&ctx.payload.msg);
        let auto = self
            .settings
            .effective(
                ctx.bot.id,
                SettingKey::PaymentAuto,
                (!ctx.room_id.is_empty()).then_some(ctx.room_id.as_str()),
            )
            .await?;

        match (&transfer.amount_minor, auto, transfer.transfer_id.is_empty()) {
            (Some(amount), true, false) => {
                let result = if *amount == PROBE_AMOUNT_MINOR {
                    info!(transfer_id = %transfer.transfer_id, "probe amount, refunding");
                    self.agent.refund_payment(&ctx.bot, &transfer.transfer_id).await
                } else {
                    info!(transfer_id = %transfer.transfer_id, amount, "accepting transfer");
                    self.agent.accept_payment(&ctx.bot, &transfer.transfer_id).await
                };
                if let Err(e) = result {
                    warn!(transfer_id = %transfer.transfer_id, error = %e, "payment action failed");
                }
            }
            (None, _, _) => {
                warn!(msgid = ctx.payload.msgid, "unparseable transfer amount");
            }
            _ => {}
        }

        ctx.normalize_to_text(compose(&transfer));
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrybot_core::Stage;
    use ferrybot_test_utils::{RecordingAgentClient, TestHarness};

    const MARKUP: &str = "<msg><appmsg><wcpayinfo>\
        <feedesc><![CDATA[¥25.50]]></feedesc>\
        <transferid><![CDATA[tid_100]]></transferid>\
        <pay_memo><![CDATA[lunch]]></pay_memo>\
        </wcpayinfo></appmsg></msg>";

    const PROBE: &str = "<msg><appmsg><wcpayinfo>\
        <feedesc><![CDATA[¥0.01]]></feedesc>\
        <transferid><![CDATA[tid_200]]></transferid>\
        </wcpayinfo></appmsg></msg>";

    #[test]
    fn parses_amount_to_minor_units() {
        let t = parse_transfer(MARKUP);
        assert_eq!(t.amount_minor, Some(2550));
        assert_eq!(t.transfer_id, "tid_100");
        assert_eq!(t.memo, "lunch");
    }

    #[test]
    fn probe_amount_is_one_minor_unit() {
        assert_eq!(parse_transfer(PROBE).amount_minor, Some(1));
    }

    #[test]
    fn unparseable_fee_yields_none() {
        let t = parse_transfer("<feedesc>twenty</feedesc>");
        assert_eq!(t.amount_minor, None);
    }

    fn payment_ctx(h: &TestHarness, markup: &str) -> ferrybot_core::EventContext {
        let mut raw = h.text_event("user_1", "", markup);
        raw.kind = "MT_RECV_TRANSFER_MSG".into();
        ferrybot_core::EventContext::new(raw, h.identity())
    }

    async fn run(h: &TestHarness, markup: &str) -> (Arc<RecordingAgentClient>, ferrybot_core::EventContext) {
        let agent = Arc::new(RecordingAgentClient::new());
        let stage = Stage::new("message").handler(Arc::new(PaymentNormalizer::new(
            h.settings(),
            Arc::clone(&agent) as Arc<dyn AgentClient>,
        )));
        let mut ctx = payment_ctx(h, markup);
        stage.run(&mut ctx).await.unwrap();
        (agent, ctx)
    }

    #[tokio::test]
    async fn normal_amount_is_accepted() {
        let h = TestHarness::new().await.unwrap();
        let (agent, ctx) = run(&h, MARKUP).await;
        assert_eq!(agent.accepted_payments().await, vec!["tid_100"]);
        assert!(agent.refunded_payments().await.is_empty());
        assert_eq!(ctx.text(), "[payment] ¥25.50 memo: lunch");
        assert_eq!(ctx.message_kind, EventKind::TextReceived);
    }

    #[tokio::test]
    async fn probe_amount_is_refunded() {
        let h = TestHarness::new().await.unwrap();
        let (agent, _ctx) = run(&h, PROBE).await;
        assert!(agent.accepted_payments().await.is_empty());
        assert_eq!(agent.refunded_payments().await, vec!["tid_200"]);
    }

    #[tokio::test]
    async fn disabled_setting_skips_action_but_still_converts() {
        let h = TestHarness::new().await.unwrap();
        h.settings()
            .set(
                h.bot.id,
                SettingKey::PaymentAuto,
                ferrybot_settings::Scope::Global,
                None,
                false,
            )
            .await
            .unwrap();
        let (agent, ctx) = run(&h, MARKUP).await;
        assert!(agent.accepted_payments().await.is_empty());
        assert!(agent.refunded_payments().await.is_empty());
        assert_eq!(ctx.message_kind, EventKind::TextReceived);
    }

    #[tokio::test]
    async fn malformed_markup_degrades_to_placeholder() {
        let h = TestHarness::new().await.unwrap();
        let (agent, ctx) = run(&h, "garbage").await;
        assert!(agent.accepted_payments().await.is_empty());
        assert_eq!(ctx.text(), "[payment] transfer received");
    }
}
