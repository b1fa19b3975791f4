use chain_op_watcher::{
    config::Config,
    models::Operation,
    notify::{format::render, NotificationSink, TelegramSink},
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting notification test...");

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => Config::from_env()?,
    };

    let telegram = &config.telegram;
    if !telegram.enabled {
        error!("Telegram is not enabled in configuration");
        std::process::exit(1);
    }
    if telegram.bot_token.is_empty() || telegram.channel_id.is_empty() {
        error!("Telegram bot_token and channel_id must both be set");
        std::process::exit(1);
    }

    let sink = TelegramSink::new(telegram)?;

    let sample = Operation {
        block_num: 123456789,
        trx_id: "test".to_string(),
        op_in_trx: 0,
        account: "test-account".to_string(),
        op_type: "transfer".to_string(),
        op_data: json!({
            "from": "test-account",
            "to": "test-recipient",
            "amount": "100.000 STEEM",
            "memo": "Test message"
        })
        .as_object()
        .cloned()
        .unwrap_or_default(),
        timestamp: Utc::now(),
        created_at: None,
    };

    let template = telegram
        .message_template
        .as_deref()
        .filter(|t| !t.trim().is_empty());
    if template.is_some() {
        info!("Using custom message template");
    } else {
        info!("Using default message template");
    }
    let message = render(None, template, &sample);

    println!("\n=== Message Preview ===");
    println!("{}", message);
    println!("=======================");

    info!("Sending test message to channel {}...", sink.channel_id());
    if let Err(e) = sink.send(&message).await {
        error!("Failed to send message: {}", e);
        std::process::exit(1);
    }

    info!("✅ Test message sent successfully!");
    Ok(())
}
