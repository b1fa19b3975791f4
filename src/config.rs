// Configuration: a YAML file, overridable from the environment (.env honored).
// Covers the chain endpoint, tracked accounts, sync cadence, the SQLite
// database and notification rules.

use crate::validation::{validate_account_name, ValidationError};
use dotenv::dotenv;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub steem: SteemConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SteemConfig {
    pub api_url: String,
    /// First block to sync when no cursor is stored. Block 0 does not exist.
    #[serde(default = "default_start_block")]
    pub start_block: u64,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// Requests per second allowed against the node; unlimited when absent.
    #[serde(default)]
    pub rpc_rate_limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,
    #[serde(default)]
    pub include_virtual_ops: bool,
    #[serde(default = "default_lock_file")]
    pub lock_file: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            error_backoff_secs: default_error_backoff_secs(),
            fetch_delay_ms: default_fetch_delay_ms(),
            include_virtual_ops: false,
            lock_file: default_lock_file(),
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
    /// Global fallback template for rules without their own.
    #[serde(default)]
    pub message_template: Option<String>,
    /// Maximum notifications in flight; defaults to the CPU count.
    #[serde(default)]
    pub concurrency: Option<usize>,

    // Legacy single-rule shape, used only when `users` is empty.
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub notify_operations: Vec<String>,

    #[serde(default)]
    pub users: Vec<RuleConfig>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            channel_id: String::new(),
            api_url: default_telegram_api_url(),
            message_template: None,
            concurrency: None,
            accounts: Vec::new(),
            notify_operations: Vec::new(),
            users: Vec::new(),
        }
    }
}

impl TelegramConfig {
    pub fn is_active(&self) -> bool {
        self.enabled && !self.bot_token.is_empty() && !self.channel_id.is_empty()
    }
}

/// One notification rule as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub name: String,
    /// Empty means every tracked account.
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Empty means every operation type.
    #[serde(default)]
    pub notify_operations: Vec<String>,
    #[serde(default)]
    pub operation_filters: HashMap<String, OperationFilterConfig>,
    #[serde(default)]
    pub message_template: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OperationFilterConfig {
    /// `transfer` only: suppress notifications for transfers to these accounts.
    #[serde(default)]
    pub ignore_to_addresses: Vec<String>,
}

/// Resolve the effective rule list.
///
/// A non-empty `users` list is used as-is. Otherwise the legacy flat fields
/// become a single rule named `default`. The flag reports whether the
/// multi-rule shape was used.
pub fn normalize_rules(telegram: &TelegramConfig) -> (Vec<RuleConfig>, bool) {
    if !telegram.users.is_empty() {
        return (telegram.users.clone(), true);
    }

    let legacy = RuleConfig {
        name: "default".to_string(),
        accounts: telegram.accounts.clone(),
        notify_operations: telegram.notify_operations.clone(),
        operation_filters: HashMap::new(),
        message_template: None,
    };
    (vec![legacy], false)
}

impl Config {
    /// Load from `CONFIG_PATH` (default `config.yaml`) after reading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        Self::load(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenv().ok();
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_yaml_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse without environment overrides or validation.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(url) = env::var("STEEM_API_URL") {
            self.steem.api_url = url;
        }
        if let Ok(path) = env::var("LOCK_FILE") {
            self.sync.lock_file = path;
        }
        if let Ok(token) = env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Ok(channel) = env::var("TELEGRAM_CHANNEL_ID") {
            self.telegram.channel_id = channel;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steem.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("steem.api_url is empty".to_string()));
        }
        if self.steem.start_block == 0 {
            return Err(ConfigError::Invalid("steem.start_block must be at least 1".to_string()));
        }
        if self.steem.batch_size == 0 {
            return Err(ConfigError::Invalid("steem.batch_size must be positive".to_string()));
        }
        if self.sync.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sync.poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.telegram.concurrency == Some(0) {
            return Err(ConfigError::Invalid(
                "telegram.concurrency must be positive".to_string(),
            ));
        }

        for account in &self.steem.accounts {
            validate_account_name(account)?;
        }
        let (rules, _) = normalize_rules(&self.telegram);
        for rule in &rules {
            for account in &rule.accounts {
                validate_account_name(account)?;
            }
        }
        Ok(())
    }
}

fn default_start_block() -> u64 {
    1
}

fn default_batch_size() -> u64 {
    100
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

fn default_database_url() -> String {
    "sqlite:data.db".to_string()
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_error_backoff_secs() -> u64 {
    5
}

fn default_fetch_delay_ms() -> u64 {
    100
}

fn default_lock_file() -> String {
    "/tmp/chain-op-watcher-sync.lock".to_string()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}
