// src/sources/baidu.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::normalize::clean_title;
use crate::sources::types::{Item, TrendSource};
use crate::sources::{apply_policy, first_string};

const BOARD_URL: &str = "https://top.baidu.com/board?tab=realtime";

/// Baidu realtime hot-search board. The board ships its data twice: as JSON
/// inside an `<!--s-data:...-->` comment and as rendered markup with
/// generated class names. The comment is the stable shape; the markup scan
/// is the fallback.
pub struct BaiduHotSource {
    client: reqwest::Client,
    skip_first: bool,
}

impl BaiduHotSource {
    pub fn new(client: reqwest::Client, skip_first: bool) -> Self {
        Self { client, skip_first }
    }
}

type Strategy = fn(&str) -> Vec<Item>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("s-data-comment", extract_s_data),
    ("search-anchors", extract_search_anchors),
];

pub(crate) fn extract_items(body: &str) -> Vec<Item> {
    for (name, strategy) in STRATEGIES {
        let items = strategy(body);
        if !items.is_empty() {
            tracing::debug!(strategy = name, count = items.len(), "baidu extraction");
            return items;
        }
        tracing::debug!(strategy = name, "baidu strategy yielded nothing, falling through");
    }
    Vec::new()
}

fn extract_s_data(body: &str) -> Vec<Item> {
    static RE_SDATA: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re = RE_SDATA.get_or_init(|| regex::Regex::new(r"(?s)<!--\s*s-data:(.*?)-->").unwrap());

    let Some(cap) = re.captures(body) else {
        return Vec::new();
    };
    let Ok(v) = serde_json::from_str::<serde_json::Value>(cap[1].trim()) else {
        return Vec::new();
    };

    let cards = v["data"]["cards"].as_array().map(|a| a.as_slice()).unwrap_or_default();
    let mut items = Vec::new();
    for card in cards {
        let content = card
            .get("content")
            .and_then(|c| c.as_array())
            .map(|a| a.as_slice())
            .unwrap_or_default();
        for entry in content {
            let Some(title) = first_string(entry, &["word", "query", "title"]).map(|t| clean_title(&t))
            else {
                continue;
            };
            if title.is_empty() {
                continue;
            }
            let url = first_string(entry, &["rawUrl", "url", "appUrl"]).unwrap_or_default();
            items.push(Item { title, url });
        }
    }
    items
}

fn extract_search_anchors(body: &str) -> Vec<Item> {
    let doc = Html::parse_document(body);
    let Ok(sel) = Selector::parse(r#"a[href*="/s?wd="]"#) else {
        return Vec::new();
    };
    let mut items = Vec::new();
    for a in doc.select(&sel) {
        let title = clean_title(&a.text().collect::<String>());
        if title.is_empty() {
            continue;
        }
        let url = a.value().attr("href").unwrap_or_default().to_string();
        items.push(Item { title, url });
    }
    items
}

#[async_trait]
impl TrendSource for BaiduHotSource {
    async fn fetch(&self, max_items: usize) -> Result<Vec<Item>> {
        let body = self
            .client
            .get(BOARD_URL)
            .send()
            .await
            .context("baidu http get")?
            .error_for_status()
            .context("baidu http status")?
            .text()
            .await
            .context("baidu http body")?;
        Ok(apply_policy(extract_items(&body), self.skip_first, max_items))
    }

    fn name(&self) -> &'static str {
        "baidu"
    }

    fn label(&self) -> &'static str {
        "百度热搜"
    }
}
