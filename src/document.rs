// src/document.rs
use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;

use crate::normalize::escape_link_text;
use crate::sources::types::{Item, ItemBatch};

/// The receiving robot gates messages on this keyword; every payload,
/// including probes and diagnostic reports, must carry it.
pub const GATE_KEYWORD: &str = "热点";

pub const DIGEST_TITLE: &str = "微博/B站/百度 热搜（Top）";
pub const PROBE_TITLE: &str = "热点内容探测";
pub const REPORT_TITLE: &str = "热搜播报异常";

// Timestamps render in fixed UTC+8 regardless of where the job runs.
static CN_OFFSET: Lazy<FixedOffset> = Lazy::new(|| FixedOffset::east_opt(8 * 3600).unwrap());

pub fn now_cn() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&*CN_OFFSET)
}

fn keyword_line() -> String {
    format!("关键字：{GATE_KEYWORD}")
}

fn timestamp_line(at: DateTime<FixedOffset>) -> String {
    format!("> 更新时间：{}", at.format("%Y-%m-%d %H:%M:%S"))
}

// Trailing double space forces a Markdown line break in the DingTalk renderer.
fn render_line(index: usize, item: &Item) -> String {
    let title = escape_link_text(&item.title);
    if item.url.is_empty() {
        format!("{index}. {title}  ")
    } else {
        format!("{index}. [{title}]({})  ", item.url)
    }
}

/// Render the full digest: keyword gate line, one section per non-empty
/// batch, trailing timestamp.
pub fn render_digest(batches: &[ItemBatch], at: DateTime<FixedOffset>) -> String {
    let mut parts = vec![keyword_line()];
    for batch in batches {
        if batch.items.is_empty() {
            continue;
        }
        parts.push(format!("# {}（Top {}）", batch.label, batch.items.len()));
        for (i, item) in batch.items.iter().enumerate() {
            parts.push(render_line(i + 1, item));
        }
    }
    parts.push(timestamp_line(at));
    parts.join("\n\n")
}

/// Render a probe payload: same line renderer as the digest so probe and
/// production content match, keyword line included so the test robot's
/// keyword gate never masks a content rejection.
pub fn render_probe(items: &[Item]) -> String {
    let mut parts = vec![keyword_line()];
    for (i, item) in items.iter().enumerate() {
        parts.push(render_line(i + 1, item));
    }
    parts.join("\n\n")
}

/// Render a diagnostic report for delivery failures and empty runs.
pub fn render_report(reason: &str, at: DateTime<FixedOffset>) -> String {
    [
        keyword_line(),
        format!("# {REPORT_TITLE}"),
        reason.to_string(),
        timestamp_line(at),
    ]
    .join("\n\n")
}
