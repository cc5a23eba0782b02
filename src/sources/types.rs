// src/sources/types.rs
use anyhow::Result;

/// One trending entry. `url` is empty when the source had no usable link.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub url: String,
}

impl Item {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Ordered items from one source, tagged with the digest section label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemBatch {
    pub label: String,
    pub items: Vec<Item>,
}

#[async_trait::async_trait]
pub trait TrendSource: Send + Sync {
    /// Fetch up to `max_items` entries in source rank order. Titles are
    /// already normalized; entries with empty titles never appear.
    async fn fetch(&self, max_items: usize) -> Result<Vec<Item>>;
    /// Stable identifier used in config and logs.
    fn name(&self) -> &'static str;
    /// Section label shown in the digest.
    fn label(&self) -> &'static str;
}
