// src/sources/mod.rs
pub mod baidu;
pub mod bilibili;
pub mod types;
pub mod weibo;

use std::time::Duration;

use anyhow::{Context, Result};

use crate::sources::types::Item;

/// Sources check the UA; a bare reqwest default gets bot-walled.
pub const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(BROWSER_UA)
        .timeout(timeout)
        .build()
        .context("building http client")
}

/// Probe field-name aliases in priority order, returning the first non-empty
/// string. Key names for the same field vary across payload shapes.
pub(crate) fn first_string(v: &serde_json::Value, keys: &[&str]) -> Option<String> {
    for k in keys {
        if let Some(s) = v.get(*k).and_then(|x| x.as_str()) {
            let t = s.trim();
            if !t.is_empty() {
                return Some(t.to_string());
            }
        }
    }
    None
}

/// Resolve a possibly-relative href against the source's base origin.
/// Unresolvable hrefs become the empty URL rather than an error.
pub(crate) fn absolutize(base: &url::Url, href: &str) -> String {
    match base.join(href) {
        Ok(u) => u.to_string(),
        Err(_) => String::new(),
    }
}

/// Apply the per-source pinned-slot policy, then the item cap.
pub(crate) fn apply_policy(mut items: Vec<Item>, skip_first: bool, max_items: usize) -> Vec<Item> {
    if skip_first && !items.is_empty() {
        items.remove(0);
    }
    items.truncate(max_items);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_probe_takes_first_non_empty() {
        let v = serde_json::json!({"title": "  ", "name": "N", "desc": "D"});
        assert_eq!(first_string(&v, &["title", "name", "desc"]), Some("N".into()));
        assert_eq!(first_string(&v, &["missing"]), None);
    }

    #[test]
    fn absolutize_keeps_absolute_and_resolves_relative() {
        let base = url::Url::parse("https://s.weibo.com/").unwrap();
        assert_eq!(
            absolutize(&base, "/weibo?q=%23x%23"),
            "https://s.weibo.com/weibo?q=%23x%23"
        );
        assert_eq!(absolutize(&base, "https://other/x"), "https://other/x");
    }

    #[test]
    fn policy_skips_pinned_slot_before_capping() {
        let items: Vec<Item> = (0..5).map(|i| Item::new(format!("t{i}"), "")).collect();
        let out = apply_policy(items.clone(), true, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].title, "t1");

        let out = apply_policy(items, false, 3);
        assert_eq!(out[0].title, "t0");
    }
}
