// src/sources/bilibili.rs
use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::normalize::clean_title;
use crate::sources::types::{Item, TrendSource};
use crate::sources::{apply_policy, first_string};

const POPULAR_API: &str = "https://api.bilibili.com/x/web-interface/popular?ps=50";
const VIDEO_BASE: &str = "https://www.bilibili.com/video/";
const SEARCH_BASE: &str = "https://search.bilibili.com/all";

/// Bilibili popular ranking via the web-interface JSON API. The `data`
/// envelope has appeared both as a bare array and as an object with the
/// entry list under several different keys.
pub struct BilibiliPopularSource {
    client: reqwest::Client,
    skip_first: bool,
}

impl BilibiliPopularSource {
    pub fn new(client: reqwest::Client, skip_first: bool) -> Self {
        Self { client, skip_first }
    }
}

pub(crate) fn extract_items(body: &str) -> Result<Vec<Item>> {
    let v: serde_json::Value = serde_json::from_str(body).context("parsing bilibili json")?;
    let data = &v["data"];

    let entries: &[serde_json::Value] = if let Some(arr) = data.as_array() {
        arr
    } else {
        ["list", "archives", "result"]
            .iter()
            .find_map(|k| data.get(*k).and_then(|x| x.as_array()))
            .map(|a| a.as_slice())
            .unwrap_or_default()
    };

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        if !entry.is_object() {
            continue;
        }
        let Some(title) = first_string(entry, &["title", "name", "desc"]).map(|t| clean_title(&t))
        else {
            continue;
        };
        if title.is_empty() {
            continue;
        }
        let url = entry_url(entry).unwrap_or_else(|| search_url(&title));
        items.push(Item { title, url });
    }
    Ok(items)
}

fn entry_url(entry: &serde_json::Value) -> Option<String> {
    if let Some(bvid) = first_string(entry, &["bvid", "bvidStr"]) {
        return Some(format!("{VIDEO_BASE}{bvid}"));
    }
    if let Some(direct) = first_string(entry, &["arcurl", "short_link", "url"]) {
        return Some(direct);
    }
    // Some feed shapes bury the id one level down.
    let param = entry.get("param")?;
    if let Some(bvid) = first_string(param, &["bvid", "bvidStr"]) {
        return Some(format!("{VIDEO_BASE}{bvid}"));
    }
    first_string(param, &["uri", "url"])
}

/// No id, no link: fall back to a search link so the entry stays clickable.
fn search_url(title: &str) -> String {
    match url::Url::parse_with_params(SEARCH_BASE, &[("keyword", title)]) {
        Ok(u) => u.to_string(),
        Err(_) => String::new(),
    }
}

#[async_trait]
impl TrendSource for BilibiliPopularSource {
    async fn fetch(&self, max_items: usize) -> Result<Vec<Item>> {
        let body = self
            .client
            .get(POPULAR_API)
            .send()
            .await
            .context("bilibili http get")?
            .error_for_status()
            .context("bilibili http status")?
            .text()
            .await
            .context("bilibili http body")?;
        Ok(apply_policy(extract_items(&body)?, self.skip_first, max_items))
    }

    fn name(&self) -> &'static str {
        "bilibili"
    }

    fn label(&self) -> &'static str {
        "B站热榜"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POPULAR: &str = include_str!("../../tests/fixtures/bilibili_popular.json");
    const NESTED: &str = include_str!("../../tests/fixtures/bilibili_popular_nested.json");

    #[test]
    fn parses_list_shape_with_bvid() {
        let items = extract_items(POPULAR).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "第一个视频");
        assert_eq!(items[0].url, "https://www.bilibili.com/video/BV1xx411c7mD");
        // second entry has no bvid but a short_link
        assert_eq!(items[1].url, "https://b23.tv/abc123");
    }

    #[test]
    fn probes_nested_param_and_alias_titles() {
        let items = extract_items(NESTED).unwrap();
        assert_eq!(items.len(), 2);
        // title came from `desc`, url from `param.bvid`
        assert_eq!(items[0].title, "备用标题字段");
        assert_eq!(items[0].url, "https://www.bilibili.com/video/BV1yy411aaaa");
        // nothing linkable at all: search fallback, percent-encoded
        assert!(items[1].url.starts_with("https://search.bilibili.com/all?keyword="));
        assert!(!items[1].url.contains(' '));
    }

    #[test]
    fn unknown_envelope_yields_empty() {
        let items = extract_items(r#"{"code":0,"data":{"unknown":[]}}"#).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn garbage_body_is_an_error() {
        assert!(extract_items("not json").is_err());
    }
}
