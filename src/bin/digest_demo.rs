//! Demo that renders a canned digest (and pushes it when DINGTALK_WEBHOOK
//! is set in the environment).

use trending_digest::document;
use trending_digest::notify::dingtalk::DingTalkChannel;
use trending_digest::notify::DeliveryChannel;
use trending_digest::{Item, ItemBatch};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let batches = vec![
        ItemBatch {
            label: "微博热搜".into(),
            items: vec![
                Item::new("演示话题一", "https://s.weibo.com/weibo?q=%23demo1%23"),
                Item::new("演示话题二", ""),
            ],
        },
        ItemBatch {
            label: "B站热榜".into(),
            items: vec![Item::new("演示视频", "https://www.bilibili.com/video/BV1xx411c7mD")],
        },
    ];

    let text = document::render_digest(&batches, document::now_cn());
    println!("{text}");

    if let Ok(webhook) = std::env::var("DINGTALK_WEBHOOK") {
        let channel = DingTalkChannel::new(webhook);
        let outcome = channel.deliver(document::DIGEST_TITLE, &text, false).await;
        println!("delivery outcome: {outcome:?}");
    }
}
