//! Trending Digest — Binary Entrypoint
//! One run: scrape the configured trending sources, probe content safety
//! against the test webhook when one exists, push the digest, exit.
//!
//! Invoked by an external scheduler; the process itself keeps no state.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trending_digest::config::{AppConfig, SourcePolicies};
use trending_digest::notify::dingtalk::DingTalkChannel;
use trending_digest::notify::DeliveryChannel;
use trending_digest::probe::SafetyProber;
use trending_digest::sources::baidu::BaiduHotSource;
use trending_digest::sources::bilibili::BilibiliPopularSource;
use trending_digest::sources::weibo::WeiboHotSource;
use trending_digest::sources::{self, types::TrendSource};
use trending_digest::pipeline;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trending_digest=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op where the scheduler injects real env.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = ?e, "configuration error");
            return ExitCode::from(2);
        }
    };
    let policies = match SourcePolicies::load_default() {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = ?e, "source policy error");
            return ExitCode::from(2);
        }
    };

    let client = match sources::http_client(cfg.http_timeout) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = ?e, "http client error");
            return ExitCode::from(2);
        }
    };

    let mut active: Vec<Box<dyn TrendSource>> = Vec::new();
    let weibo = policies.get("weibo");
    if weibo.enabled {
        active.push(Box::new(WeiboHotSource::new(client.clone(), weibo.skip_first)));
    }
    let bilibili = policies.get("bilibili");
    if bilibili.enabled {
        active.push(Box::new(BilibiliPopularSource::new(client.clone(), bilibili.skip_first)));
    }
    let baidu = policies.get("baidu");
    if baidu.enabled {
        active.push(Box::new(BaiduHotSource::new(client, baidu.skip_first)));
    }

    let production =
        DingTalkChannel::new(cfg.production_webhook.clone()).with_timeout(cfg.delivery_timeout.as_secs());
    let prober = cfg.test_webhook.as_ref().map(|url| {
        let channel: Arc<dyn DeliveryChannel> =
            Arc::new(DingTalkChannel::new(url.clone()).with_timeout(cfg.delivery_timeout.as_secs()));
        SafetyProber::new(channel, cfg.probe_delay)
    });
    if prober.is_none() {
        tracing::warn!("no test webhook configured; content probing disabled, items pass through");
    }

    match pipeline::run_once(&active, &production, prober.as_ref(), cfg.max_items).await {
        Ok(summary) => {
            tracing::info!(
                fetched = summary.fetched,
                delivered = summary.delivered,
                dropped = summary.dropped,
                "run complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = ?e, "run failed");
            ExitCode::FAILURE
        }
    }
}
