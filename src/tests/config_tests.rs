//! tests/config_tests.rs - Config parsing, defaults, rule normalization

use crate::config::{normalize_rules, Config, ConfigError};
use crate::validation::ValidationError;
use std::io::Write;

const MULTI_RULE: &str = r#"
steem:
  api_url: "https://api.steemit.com"
  start_block: 90000000
  accounts: ["sps.fund", "steemit"]
  batch_size: 50
sync:
  include_virtual_ops: true
telegram:
  enabled: true
  bot_token: "123:abc"
  channel_id: "@watchers"
  users:
    - name: "fund"
      accounts: ["sps.fund"]
      notify_operations: ["transfer"]
      operation_filters:
        transfer:
          ignore_to_addresses: ["exchange"]
      message_template: "{{.Account}}: {{.OpType}}"
    - name: "all"
"#;

#[test]
fn parses_multi_rule_config() {
    let config = Config::from_yaml_str(MULTI_RULE).unwrap();
    config.validate().unwrap();

    assert_eq!(config.steem.start_block, 90000000);
    assert_eq!(config.steem.batch_size, 50);
    assert!(config.sync.include_virtual_ops);
    assert!(config.telegram.is_active());

    let (rules, multi) = normalize_rules(&config.telegram);
    assert!(multi);
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].name, "fund");
    assert_eq!(
        rules[0].operation_filters["transfer"].ignore_to_addresses,
        vec!["exchange".to_string()]
    );
    assert!(rules[1].accounts.is_empty());
    assert!(rules[1].notify_operations.is_empty());
}

#[test]
fn defaults_fill_missing_sections() {
    let config = Config::from_yaml_str("steem:\n  api_url: \"http://node\"\n").unwrap();

    assert_eq!(config.steem.start_block, 1);
    assert_eq!(config.steem.batch_size, 100);
    assert_eq!(config.steem.rpc_timeout_secs, 30);
    assert_eq!(config.database.url, "sqlite:data.db");
    assert_eq!(config.sync.poll_interval().as_secs(), 3);
    assert_eq!(config.sync.error_backoff().as_secs(), 5);
    assert_eq!(config.sync.fetch_delay().as_millis(), 100);
    assert!(!config.sync.include_virtual_ops);
    assert!(!config.telegram.is_active());
    assert_eq!(config.telegram.api_url, "https://api.telegram.org");
}

#[test]
fn legacy_fields_become_default_rule() {
    let config = Config::from_yaml_str(
        r#"
steem:
  api_url: "http://node"
telegram:
  enabled: true
  accounts: ["steemit"]
  notify_operations: ["transfer", "vote"]
"#,
    )
    .unwrap();

    let (rules, multi) = normalize_rules(&config.telegram);
    assert!(!multi);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].name, "default");
    assert_eq!(rules[0].accounts, vec!["steemit".to_string()]);
    assert_eq!(rules[0].notify_operations.len(), 2);
    assert!(rules[0].operation_filters.is_empty());
}

#[test]
fn enabled_without_credentials_is_inactive() {
    let config = Config::from_yaml_str(
        "steem:\n  api_url: \"http://node\"\ntelegram:\n  enabled: true\n",
    )
    .unwrap();
    assert!(!config.telegram.is_active());
}

#[test]
fn validation_rejects_bad_values() {
    let mut config = Config::from_yaml_str(MULTI_RULE).unwrap();
    config.steem.batch_size = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = Config::from_yaml_str(MULTI_RULE).unwrap();
    config.steem.start_block = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = Config::from_yaml_str(MULTI_RULE).unwrap();
    config.steem.accounts.push("Bad_Name".to_string());
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Validation(ValidationError::InvalidAccountName(_)))
    ));

    let mut config = Config::from_yaml_str(MULTI_RULE).unwrap();
    config.steem.api_url = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let result = Config::from_yaml_str("steem: [not, a, map");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn load_reads_file_and_reports_missing_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MULTI_RULE.as_bytes()).unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.steem.accounts, vec!["sps.fund", "steemit"]);

    let missing = Config::load("/nonexistent/chain-op-watcher.yaml");
    assert!(matches!(missing, Err(ConfigError::Read { .. })));
}
