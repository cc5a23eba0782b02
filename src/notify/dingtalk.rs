// src/notify/dingtalk.rs
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{DeliveryChannel, DeliveryOutcome};

/// errcode the endpoint returns when its moderation refuses the content.
pub const REJECTED_ERRCODE: i64 = 430104;

#[derive(Clone)]
pub struct DingTalkChannel {
    webhook: String,
    client: Client,
    timeout: Duration,
}

impl DingTalkChannel {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[derive(Serialize)]
struct WebhookPayload {
    msgtype: &'static str,
    markdown: MarkdownBody,
}

#[derive(Serialize)]
struct MarkdownBody {
    title: String,
    text: String,
}

#[derive(Deserialize)]
struct Ack {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Map the endpoint's acknowledgment body to an outcome. Anything that is
/// not a clean accept or an explicit moderation refusal counts as transient.
pub fn classify_ack(body: &str) -> DeliveryOutcome {
    match serde_json::from_str::<Ack>(body) {
        Ok(ack) if ack.errcode == 0 => DeliveryOutcome::Success,
        Ok(ack) if ack.errcode == REJECTED_ERRCODE => DeliveryOutcome::ContentRejected,
        Ok(ack) => {
            tracing::warn!(errcode = ack.errcode, errmsg = %ack.errmsg, "dingtalk error ack");
            DeliveryOutcome::TransientError
        }
        Err(_) => {
            tracing::warn!(body = %body, "unparseable dingtalk ack");
            DeliveryOutcome::TransientError
        }
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for DingTalkChannel {
    async fn deliver(&self, title: &str, markdown: &str, probe: bool) -> DeliveryOutcome {
        let mode = if probe { "probe" } else { "production" };
        let payload = WebhookPayload {
            msgtype: "markdown",
            markdown: MarkdownBody {
                title: title.to_string(),
                text: markdown.to_string(),
            },
        };

        let res = self
            .client
            .post(&self.webhook)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await;

        match res {
            Ok(rsp) => {
                if let Err(e) = rsp.error_for_status_ref() {
                    tracing::warn!(error = %e, mode, "dingtalk http error");
                    return DeliveryOutcome::TransientError;
                }
                match rsp.text().await {
                    Ok(body) => {
                        let outcome = classify_ack(&body);
                        tracing::debug!(mode, outcome = ?outcome, "dingtalk delivery");
                        outcome
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, mode, "dingtalk body read failed");
                        DeliveryOutcome::TransientError
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, mode, "dingtalk request failed");
                DeliveryOutcome::TransientError
            }
        }
    }
}
