pub mod api;
pub mod blockchain;
pub mod config;
pub mod db;
pub mod lock;
pub mod models;
pub mod notify;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::ApiError;
pub use blockchain::{BlockProcessor, ChainSource, SteemClient, SyncEngine};
pub use config::Config;
pub use db::{OperationStore, SqliteStore};
pub use lock::InstanceLock;
pub use models::{Operation, OperationPage, SyncState};
pub use notify::{NotificationRouter, NotificationSink, TelegramSink};
