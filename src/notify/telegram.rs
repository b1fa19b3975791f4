use crate::config::TelegramConfig;
use crate::notify::{NotificationSink, NotifyError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts messages to one Telegram channel through the Bot API.
pub struct TelegramSink {
    http: reqwest::Client,
    api_url: String,
    bot_token: String,
    channel_id: String,
}

impl TelegramSink {
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;

        info!("Telegram notifications enabled for channel {}", config.channel_id);

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            channel_id: config.channel_id.clone(),
        })
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let request = SendMessageRequest {
            chat_id: &self.channel_id,
            text: message,
            parse_mode: "HTML",
        };

        // Telegram reports failures in the body, often with a non-2xx status too.
        let response: TelegramResponse = self.http.post(&url).json(&request).send().await?.json().await?;

        if !response.ok {
            return Err(NotifyError::Api(
                response
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        debug!("Delivered notification to {}", self.channel_id);
        Ok(())
    }
}
