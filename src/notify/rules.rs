use crate::config::{OperationFilterConfig, RuleConfig};
use crate::models::Operation;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Per-type filter compiled from [`OperationFilterConfig`].
#[derive(Debug, Clone, Default)]
pub struct OperationFilter {
    ignore_to: HashSet<String>,
}

impl From<&OperationFilterConfig> for OperationFilter {
    fn from(config: &OperationFilterConfig) -> Self {
        Self {
            ignore_to: config.ignore_to_addresses.iter().cloned().collect(),
        }
    }
}

impl OperationFilter {
    /// Only `transfer` has filter semantics; other types always pass.
    pub fn passes(&self, op: &Operation) -> bool {
        match op.op_type.as_str() {
            "transfer" => self.passes_transfer(op),
            _ => true,
        }
    }

    fn passes_transfer(&self, op: &Operation) -> bool {
        if self.ignore_to.is_empty() {
            return true;
        }
        match op.op_data.get("to").and_then(Value::as_str) {
            Some(to) => !self.ignore_to.contains(to),
            None => true,
        }
    }
}

/// A notification rule with its scopes compiled into sets.
///
/// An empty account or operation-type set matches everything.
#[derive(Debug, Clone)]
pub struct NotificationRule {
    pub name: String,
    accounts: HashSet<String>,
    op_types: HashSet<String>,
    filters: HashMap<String, OperationFilter>,
    pub message_template: Option<String>,
}

impl From<&RuleConfig> for NotificationRule {
    fn from(config: &RuleConfig) -> Self {
        Self {
            name: config.name.clone(),
            accounts: config.accounts.iter().cloned().collect(),
            op_types: config.notify_operations.iter().cloned().collect(),
            filters: config
                .operation_filters
                .iter()
                .map(|(op_type, filter)| (op_type.clone(), OperationFilter::from(filter)))
                .collect(),
            message_template: config
                .message_template
                .clone()
                .filter(|t| !t.trim().is_empty()),
        }
    }
}

impl NotificationRule {
    pub fn matches_type(&self, op: &Operation) -> bool {
        self.op_types.is_empty() || self.op_types.contains(&op.op_type)
    }

    pub fn matches_account(&self, op: &Operation) -> bool {
        self.accounts.is_empty() || self.accounts.contains(&op.account)
    }

    pub fn passes_filters(&self, op: &Operation) -> bool {
        match self.filters.get(&op.op_type) {
            Some(filter) => filter.passes(op),
            None => true,
        }
    }

    /// Type scope, account scope and per-type filter must all pass.
    pub fn matches(&self, op: &Operation) -> bool {
        self.matches_type(op) && self.matches_account(op) && self.passes_filters(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn op(account: &str, op_type: &str, data: Value) -> Operation {
        Operation {
            block_num: 1,
            trx_id: "t".to_string(),
            op_in_trx: 0,
            account: account.to_string(),
            op_type: op_type.to_string(),
            op_data: data.as_object().cloned().unwrap(),
            timestamp: Utc::now(),
            created_at: None,
        }
    }

    #[test]
    fn empty_scopes_match_everything() {
        let rule = NotificationRule::from(&RuleConfig::default());
        assert!(rule.matches(&op("alice", "vote", json!({}))));
        assert!(rule.matches(&op("bob", "transfer", json!({"to": "x"}))));
    }

    #[test]
    fn account_and_type_scopes_are_both_required() {
        let rule = NotificationRule::from(&RuleConfig {
            name: "r".to_string(),
            accounts: vec!["alice".to_string()],
            notify_operations: vec!["transfer".to_string()],
            ..Default::default()
        });
        assert!(rule.matches(&op("alice", "transfer", json!({}))));
        assert!(!rule.matches(&op("alice", "vote", json!({}))));
        assert!(!rule.matches(&op("bob", "transfer", json!({}))));
    }

    #[test]
    fn filter_for_other_type_does_not_apply() {
        let mut filters = HashMap::new();
        filters.insert(
            "transfer".to_string(),
            OperationFilterConfig {
                ignore_to_addresses: vec!["exchange".to_string()],
            },
        );
        let rule = NotificationRule::from(&RuleConfig {
            operation_filters: filters,
            ..Default::default()
        });
        assert!(!rule.matches(&op("alice", "transfer", json!({"to": "exchange"}))));
        assert!(rule.matches(&op("alice", "transfer_to_savings", json!({"to": "exchange"}))));
        assert!(rule.matches(&op("alice", "transfer", json!({"memo": "no recipient"}))));
    }

    #[test]
    fn blank_template_is_treated_as_unset() {
        let rule = NotificationRule::from(&RuleConfig {
            message_template: Some("   ".to_string()),
            ..Default::default()
        });
        assert!(rule.message_template.is_none());
    }
}
