// src/pipeline.rs
use anyhow::{bail, Result};

use crate::document;
use crate::notify::{DeliveryChannel, DeliveryOutcome};
use crate::probe::SafetyProber;
use crate::sources::types::{ItemBatch, TrendSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Items fetched across all sources, after per-source policy and cap.
    pub fetched: usize,
    /// Items in the delivered digest.
    pub delivered: usize,
    /// Items removed by content probing.
    pub dropped: usize,
}

/// One full run: fetch every source, probe if a test channel exists, render,
/// deliver once. A failing source degrades to an empty batch; an entirely
/// empty run or a failed final delivery produces a diagnostic report and an
/// error.
pub async fn run_once(
    sources: &[Box<dyn TrendSource>],
    production: &dyn DeliveryChannel,
    prober: Option<&SafetyProber>,
    max_items: usize,
) -> Result<RunSummary> {
    let mut batches: Vec<ItemBatch> = Vec::with_capacity(sources.len());
    for source in sources {
        let items = match source.fetch(max_items).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = ?e, source = source.name(), "source fetch failed");
                Vec::new()
            }
        };
        tracing::info!(source = source.name(), count = items.len(), "fetched");
        batches.push(ItemBatch {
            label: source.label().to_string(),
            items,
        });
    }

    let fetched: usize = batches.iter().map(|b| b.items.len()).sum();
    if fetched == 0 {
        report_failure(production, "所有来源均未抓到任何条目").await;
        bail!("all sources returned zero items");
    }

    let mut dropped = 0usize;
    if let Some(prober) = prober {
        for batch in &mut batches {
            if batch.items.is_empty() {
                continue;
            }
            let before = batch.items.len();
            batch.items = prober.filter(&batch.label, std::mem::take(&mut batch.items)).await;
            dropped += before - batch.items.len();
        }
    }

    let delivered: usize = batches.iter().map(|b| b.items.len()).sum();
    if delivered == 0 {
        report_failure(production, "内容探测移除了全部条目").await;
        bail!("content probing removed every item");
    }

    let text = document::render_digest(&batches, document::now_cn());
    match production.deliver(document::DIGEST_TITLE, &text, false).await {
        DeliveryOutcome::Success => {
            tracing::info!(fetched, delivered, dropped, "digest delivered");
            Ok(RunSummary {
                fetched,
                delivered,
                dropped,
            })
        }
        outcome => {
            report_failure(production, &format!("最终推送失败（{outcome:?}）")).await;
            bail!("final delivery failed: {outcome:?}");
        }
    }
}

/// Best-effort diagnostic report through the production channel. Its own
/// outcome is logged, never recursed on.
async fn report_failure(channel: &dyn DeliveryChannel, reason: &str) {
    let text = document::render_report(reason, document::now_cn());
    let outcome = channel.deliver(document::REPORT_TITLE, &text, false).await;
    tracing::warn!(reason, outcome = ?outcome, "diagnostic report sent");
}
