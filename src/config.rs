// src/config.rs
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

const ENV_WEBHOOK: &str = "DINGTALK_WEBHOOK";
const ENV_TEST_WEBHOOK: &str = "DINGTALK_TEST_WEBHOOK";
const ENV_SOURCES_PATH: &str = "TREND_SOURCES_PATH";

/// Runtime configuration, built once at process start and passed down.
/// Nothing here touches the network.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Production webhook. Required; absence is fatal before any fetch.
    pub production_webhook: String,
    /// Optional test webhook with identical response semantics. Absent →
    /// content probing is skipped and items pass through unfiltered.
    pub test_webhook: Option<String>,
    pub max_items: usize,
    pub http_timeout: Duration,
    pub delivery_timeout: Duration,
    pub probe_delay: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let production_webhook = non_empty_var(ENV_WEBHOOK)
            .ok_or_else(|| anyhow!("environment variable {ENV_WEBHOOK} not set"))?;

        Ok(Self {
            production_webhook,
            test_webhook: non_empty_var(ENV_TEST_WEBHOOK),
            max_items: env_or("TREND_MAX_ITEMS", 15),
            http_timeout: Duration::from_secs(env_or("HTTP_TIMEOUT_SECS", 15)),
            delivery_timeout: Duration::from_secs(env_or("DELIVERY_TIMEOUT_SECS", 10)),
            probe_delay: Duration::from_millis(env_or("PROBE_DELAY_MS", 1000)),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Per-source knobs. `skip_first` drops the pinned/promotional slot before
/// the item cap is applied; which sources pin their first slot has changed
/// over time, so it is config, not code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct SourcePolicy {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub skip_first: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for SourcePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_first: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePolicies(BTreeMap<String, SourcePolicy>);

#[derive(serde::Deserialize)]
struct PolicyFile {
    #[serde(default)]
    sources: BTreeMap<String, SourcePolicy>,
}

impl SourcePolicies {
    /// Built-in defaults: Weibo's list leads with a pinned topic, the
    /// others are organic from index 0.
    pub fn builtin() -> Self {
        let mut map = BTreeMap::new();
        map.insert(
            "weibo".to_string(),
            SourcePolicy {
                enabled: true,
                skip_first: true,
            },
        );
        map.insert("bilibili".to_string(), SourcePolicy::default());
        map.insert("baidu".to_string(), SourcePolicy::default());
        Self(map)
    }

    /// Load using env override + fallback:
    /// 1) $TREND_SOURCES_PATH
    /// 2) config/sources.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path"));
        }
        let default = PathBuf::from("config/sources.toml");
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::builtin())
    }

    /// Parse a policy file and overlay it on the built-in defaults, so a
    /// file only needs to name the sources it changes.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading source policies from {}", path.display()))?;
        let file: PolicyFile = toml::from_str(&content)
            .with_context(|| format!("parsing source policies from {}", path.display()))?;
        let mut merged = Self::builtin();
        for (name, policy) in file.sources {
            merged.0.insert(name, policy);
        }
        Ok(merged)
    }

    pub fn get(&self, name: &str) -> SourcePolicy {
        self.0.get(name).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn builtin_skips_only_weibo_pinned_slot() {
        let p = SourcePolicies::builtin();
        assert!(p.get("weibo").skip_first);
        assert!(!p.get("bilibili").skip_first);
        assert!(!p.get("baidu").skip_first);
        assert!(p.get("weibo").enabled);
    }

    #[test]
    fn policy_file_overlays_builtin() {
        let parsed: PolicyFile = toml::from_str(
            r#"
            [sources.weibo]
            skip_first = false

            [sources.baidu]
            enabled = false
            "#,
        )
        .unwrap();
        let mut merged = SourcePolicies::builtin();
        for (name, policy) in parsed.sources {
            merged.0.insert(name, policy);
        }
        assert!(!merged.get("weibo").skip_first);
        assert!(!merged.get("baidu").enabled);
        // untouched source keeps the builtin entry
        assert!(merged.get("bilibili").enabled);
    }

    #[serial_test::serial]
    #[test]
    fn missing_production_webhook_is_an_error() {
        env::remove_var(ENV_WEBHOOK);
        env::remove_var(ENV_TEST_WEBHOOK);
        assert!(AppConfig::from_env().is_err());

        env::set_var(ENV_WEBHOOK, "https://oapi.dingtalk.com/robot/send?access_token=x");
        let cfg = AppConfig::from_env().unwrap();
        assert!(cfg.test_webhook.is_none());
        assert_eq!(cfg.max_items, 15);
        env::remove_var(ENV_WEBHOOK);
    }

    #[serial_test::serial]
    #[test]
    fn test_webhook_enables_probing_and_tunables_parse() {
        env::set_var(ENV_WEBHOOK, "https://example/prod");
        env::set_var(ENV_TEST_WEBHOOK, "https://example/test");
        env::set_var("PROBE_DELAY_MS", "250");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.test_webhook.as_deref(), Some("https://example/test"));
        assert_eq!(cfg.probe_delay, Duration::from_millis(250));
        env::remove_var(ENV_WEBHOOK);
        env::remove_var(ENV_TEST_WEBHOOK);
        env::remove_var("PROBE_DELAY_MS");
    }
}
