pub mod format;
pub mod router;
pub mod rules;
pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

pub use router::{DispatchSummary, NotificationRouter};
pub use rules::NotificationRule;
pub use telegram::TelegramSink;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Destination for rendered notification messages.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}
