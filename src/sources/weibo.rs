// src/sources/weibo.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::normalize::clean_title;
use crate::sources::types::{Item, TrendSource};
use crate::sources::{absolutize, apply_policy};

const SUMMARY_URL: &str = "https://s.weibo.com/top/summary";
const BASE_ORIGIN: &str = "https://s.weibo.com/";

/// Weibo hot-search list. The page has shipped at least three markup shapes;
/// strategies are tried in order and the first that yields items wins.
pub struct WeiboHotSource {
    client: reqwest::Client,
    skip_first: bool,
}

impl WeiboHotSource {
    pub fn new(client: reqwest::Client, skip_first: bool) -> Self {
        Self { client, skip_first }
    }
}

type Strategy = fn(&str) -> Vec<Item>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("rank-table", extract_rank_table),
    ("pagelet-json", extract_pagelet_json),
    ("loose-anchors", extract_loose_anchors),
];

pub(crate) fn extract_items(body: &str) -> Vec<Item> {
    for (name, strategy) in STRATEGIES {
        let items = strategy(body);
        if !items.is_empty() {
            tracing::debug!(strategy = name, count = items.len(), "weibo extraction");
            return items;
        }
        tracing::debug!(strategy = name, "weibo strategy yielded nothing, falling through");
    }
    Vec::new()
}

/// Primary: the rank table, one `td.td-02 a` anchor per topic.
fn extract_rank_table(body: &str) -> Vec<Item> {
    let doc = Html::parse_document(body);
    collect_anchors(&doc, "td.td-02 a")
}

/// Secondary: topic table delivered as an HTML string inside pagelet JSON
/// embedded in a script tag.
fn extract_pagelet_json(body: &str) -> Vec<Item> {
    let doc = Html::parse_document(body);
    let Ok(sel) = Selector::parse("script") else {
        return Vec::new();
    };
    static RE_OBJ: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_obj = RE_OBJ.get_or_init(|| regex::Regex::new(r"(?s)\{.*\}").unwrap());

    for script in doc.select(&sel) {
        let text: String = script.text().collect();
        if !text.contains("STK && STK.pageletM && STK.pageletM.view") && !text.contains("var $CONFIG")
        {
            continue;
        }
        let Some(m) = re_obj.find(&text) else {
            continue;
        };
        let Ok(v) = serde_json::from_str::<serde_json::Value>(m.as_str()) else {
            continue;
        };
        let Some(inner) = v.get("mods").and_then(|m| m.get("html")).and_then(|h| h.as_str())
        else {
            continue;
        };
        let fragment = Html::parse_fragment(inner);
        let items = collect_anchors(&fragment, "td.td-02 a");
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}

/// Last resort: any anchor that links into topic search.
fn extract_loose_anchors(body: &str) -> Vec<Item> {
    let doc = Html::parse_document(body);
    collect_anchors(&doc, r#"a[href*="/weibo?q="]"#)
}

fn collect_anchors(doc: &Html, selector: &str) -> Vec<Item> {
    let Ok(sel) = Selector::parse(selector) else {
        return Vec::new();
    };
    let base = match url::Url::parse(BASE_ORIGIN) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };
    let mut items = Vec::new();
    for a in doc.select(&sel) {
        let title = clean_title(&a.text().collect::<String>());
        if title.is_empty() {
            continue;
        }
        let url = match a.value().attr("href") {
            Some(href) if !href.starts_with("javascript:") => absolutize(&base, href),
            _ => String::new(),
        };
        items.push(Item { title, url });
    }
    items
}

#[async_trait]
impl TrendSource for WeiboHotSource {
    async fn fetch(&self, max_items: usize) -> Result<Vec<Item>> {
        let body = self
            .client
            .get(SUMMARY_URL)
            .send()
            .await
            .context("weibo http get")?
            .error_for_status()
            .context("weibo http status")?
            .text()
            .await
            .context("weibo http body")?;
        Ok(apply_policy(extract_items(&body), self.skip_first, max_items))
    }

    fn name(&self) -> &'static str {
        "weibo"
    }

    fn label(&self) -> &'static str {
        "微博热搜"
    }
}
