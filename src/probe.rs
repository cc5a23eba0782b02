// src/probe.rs
use std::sync::Arc;
use std::time::Duration;

use crate::document;
use crate::notify::{DeliveryChannel, DeliveryOutcome};
use crate::sources::types::Item;

/// Discovers which items a moderation-gated channel will accept, given only
/// a batch-level accept/reject signal, by bisecting rejected ranges against
/// a test endpoint with the same response semantics as production.
pub struct SafetyProber {
    channel: Arc<dyn DeliveryChannel>,
    delay: Duration,
}

impl SafetyProber {
    pub fn new(channel: Arc<dyn DeliveryChannel>, delay: Duration) -> Self {
        Self { channel, delay }
    }

    /// Return the items the channel accepts, in their original order.
    ///
    /// Accepted ranges are kept whole; a rejected range of one is dropped;
    /// a longer rejected range is split and both halves probed
    /// independently. `TransientError` counts as acceptance: a flaky
    /// network must not discard safe items. Costs O(log n) probes when
    /// offenders are few, at most 2n-1.
    pub async fn filter(&self, source: &str, items: Vec<Item>) -> Vec<Item> {
        if items.is_empty() {
            return items;
        }

        let mut kept: Vec<Item> = Vec::with_capacity(items.len());
        // Depth-first over subranges, left half on top, so accepted ranges
        // land in `kept` in source order. Explicit stack keeps the probe
        // depth independent of the batch size.
        let mut pending = vec![(0usize, items.len())];
        let mut probes = 0usize;

        while let Some((lo, hi)) = pending.pop() {
            if probes > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            probes += 1;

            let slice = &items[lo..hi];
            let text = document::render_probe(slice);
            match self.channel.deliver(document::PROBE_TITLE, &text, true).await {
                DeliveryOutcome::ContentRejected if hi - lo == 1 => {
                    tracing::info!(source, title = %items[lo].title, "dropping rejected item");
                }
                DeliveryOutcome::ContentRejected => {
                    let mid = lo + (hi - lo) / 2;
                    pending.push((mid, hi));
                    pending.push((lo, mid));
                }
                DeliveryOutcome::TransientError => {
                    tracing::warn!(source, lo, hi, "probe transient failure, keeping range");
                    kept.extend_from_slice(slice);
                }
                DeliveryOutcome::Success => kept.extend_from_slice(slice),
            }
        }

        tracing::info!(
            source,
            probes,
            kept = kept.len(),
            total = items.len(),
            "content probing finished"
        );
        kept
    }
}
