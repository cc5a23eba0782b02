// src/notify/mod.rs
pub mod dingtalk;

/// Classified result of one webhook delivery attempt. Drives both the
/// safety prober's recursion and the orchestrator's reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Endpoint acknowledged with `errcode == 0`.
    Success,
    /// The endpoint's content moderation refused the payload.
    ContentRejected,
    /// Network failure, timeout, unparseable acknowledgment, or any other
    /// nonzero error code.
    TransientError,
}

#[async_trait::async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// One outbound request, outcome classified, never panicking. `probe`
    /// only relabels the logs; probing and production must share transport
    /// and classification or bisection results would not transfer.
    async fn deliver(&self, title: &str, markdown: &str, probe: bool) -> DeliveryOutcome;
}
