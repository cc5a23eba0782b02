// tests/pipeline_e2e.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use trending_digest::document::{DIGEST_TITLE, REPORT_TITLE};
use trending_digest::pipeline::run_once;
use trending_digest::{DeliveryChannel, DeliveryOutcome, Item, SafetyProber, TrendSource};

struct StubSource {
    name: &'static str,
    label: &'static str,
    titles: Vec<String>,
}

impl StubSource {
    fn counted(name: &'static str, label: &'static str, count: usize) -> Self {
        Self {
            name,
            label,
            titles: (0..count).map(|i| format!("{name}-{i}")).collect(),
        }
    }
}

#[async_trait]
impl TrendSource for StubSource {
    async fn fetch(&self, max_items: usize) -> Result<Vec<Item>> {
        Ok(self
            .titles
            .iter()
            .take(max_items)
            .map(|t| Item::new(t.clone(), ""))
            .collect())
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn label(&self) -> &'static str {
        self.label
    }
}

struct BrokenSource;

#[async_trait]
impl TrendSource for BrokenSource {
    async fn fetch(&self, _max_items: usize) -> Result<Vec<Item>> {
        bail!("connection reset by peer")
    }

    fn name(&self) -> &'static str {
        "broken"
    }

    fn label(&self) -> &'static str {
        "坏掉的源"
    }
}

/// Records every delivery; outcome per message decided by a closure on the
/// rendered text.
struct RecordingChannel {
    sent: Mutex<Vec<(String, String)>>,
    verdict: Box<dyn Fn(&str, &str) -> DeliveryOutcome + Send + Sync>,
}

impl RecordingChannel {
    fn accepting() -> Self {
        Self::with_verdict(|_, _| DeliveryOutcome::Success)
    }

    fn with_verdict(
        verdict: impl Fn(&str, &str) -> DeliveryOutcome + Send + Sync + 'static,
    ) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            verdict: Box::new(verdict),
        }
    }

    fn titles(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn deliver(&self, title: &str, markdown: &str, _probe: bool) -> DeliveryOutcome {
        self.sent.lock().push((title.to_string(), markdown.to_string()));
        (self.verdict)(title, markdown)
    }
}

#[tokio::test]
async fn empty_third_source_does_not_block_the_digest() {
    let sources: Vec<Box<dyn TrendSource>> = vec![
        Box::new(StubSource::counted("s1", "源一", 15)),
        Box::new(StubSource::counted("s2", "源二", 15)),
        Box::new(StubSource::counted("s3", "源三", 0)),
    ];
    let channel = RecordingChannel::accepting();

    let summary = run_once(&sources, &channel, None, 15).await.unwrap();

    assert_eq!(summary.fetched, 30);
    assert_eq!(summary.delivered, 30);
    assert_eq!(summary.dropped, 0);

    let sent = channel.sent.lock();
    assert_eq!(sent.len(), 1, "exactly one production delivery, no report");
    let (title, text) = &sent[0];
    assert_eq!(title, DIGEST_TITLE);
    assert_eq!(text.matches("s1-").count(), 15);
    assert_eq!(text.matches("s2-").count(), 15);
    assert!(!text.contains("源三"), "empty source gets no section");
}

#[tokio::test]
async fn failing_source_degrades_to_empty_batch() {
    let sources: Vec<Box<dyn TrendSource>> = vec![
        Box::new(BrokenSource),
        Box::new(StubSource::counted("ok", "正常源", 3)),
    ];
    let channel = RecordingChannel::accepting();

    let summary = run_once(&sources, &channel, None, 15).await.unwrap();

    assert_eq!(summary.delivered, 3);
    assert_eq!(channel.titles(), vec![DIGEST_TITLE.to_string()]);
}

#[tokio::test]
async fn all_sources_empty_sends_one_report_and_no_digest() {
    let sources: Vec<Box<dyn TrendSource>> = vec![
        Box::new(StubSource::counted("s1", "源一", 0)),
        Box::new(BrokenSource),
    ];
    let channel = RecordingChannel::accepting();

    let err = run_once(&sources, &channel, None, 15).await.unwrap_err();
    assert!(err.to_string().contains("zero items"));

    assert_eq!(channel.titles(), vec![REPORT_TITLE.to_string()]);
}

#[tokio::test]
async fn rejected_final_delivery_triggers_a_report() {
    let sources: Vec<Box<dyn TrendSource>> =
        vec![Box::new(StubSource::counted("s1", "源一", 5))];
    let channel = RecordingChannel::with_verdict(|title, _| {
        if title == DIGEST_TITLE {
            DeliveryOutcome::ContentRejected
        } else {
            DeliveryOutcome::Success
        }
    });

    let err = run_once(&sources, &channel, None, 15).await.unwrap_err();
    assert!(err.to_string().contains("final delivery failed"));

    assert_eq!(
        channel.titles(),
        vec![DIGEST_TITLE.to_string(), REPORT_TITLE.to_string()]
    );
}

#[tokio::test]
async fn probing_removes_offenders_before_the_final_digest() {
    let sources: Vec<Box<dyn TrendSource>> = vec![Box::new(StubSource {
        name: "s1",
        label: "源一",
        titles: vec!["正常一".into(), "含敏感词".into(), "正常二".into()],
    })];

    let test_channel = Arc::new(RecordingChannel::with_verdict(|_, text| {
        if text.contains("敏感") {
            DeliveryOutcome::ContentRejected
        } else {
            DeliveryOutcome::Success
        }
    }));
    let prober = SafetyProber::new(test_channel.clone(), Duration::ZERO);
    let production = RecordingChannel::accepting();

    let summary = run_once(&sources, &production, Some(&prober), 15)
        .await
        .unwrap();

    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.delivered, 2);
    assert_eq!(summary.dropped, 1);

    let sent = production.sent.lock();
    assert_eq!(sent.len(), 1);
    let (_, text) = &sent[0];
    assert!(text.contains("正常一") && text.contains("正常二"));
    assert!(!text.contains("含敏感词"));
    assert!(text.contains("（Top 2）"));
}

#[tokio::test]
async fn probing_away_everything_is_reported_not_delivered() {
    let sources: Vec<Box<dyn TrendSource>> = vec![Box::new(StubSource {
        name: "s1",
        label: "源一",
        titles: vec!["全是敏感词".into()],
    })];

    let test_channel = Arc::new(RecordingChannel::with_verdict(|_, text| {
        if text.contains("敏感") {
            DeliveryOutcome::ContentRejected
        } else {
            DeliveryOutcome::Success
        }
    }));
    let prober = SafetyProber::new(test_channel.clone(), Duration::ZERO);
    let production = RecordingChannel::accepting();

    let err = run_once(&sources, &production, Some(&prober), 15)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("removed every item"));

    assert_eq!(production.titles(), vec![REPORT_TITLE.to_string()]);
}
