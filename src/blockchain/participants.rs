//! Participant extraction table.
//!
//! Each entry maps an operation type to the `op_data` fields that name
//! accounts involved in it. Supporting a new operation type means adding a
//! row here.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Fields tried for operation types missing from the table.
pub const FALLBACK_FIELDS: &[&str] = &["account", "owner", "from", "to"];

const PARTICIPANT_FIELDS: &[(&str, &[&str])] = &[
    // user-authored
    ("vote", &["voter", "author"]),
    ("vote2", &["voter", "author"]),
    ("comment", &["parent_author", "author"]),
    ("comment_options", &["author"]),
    ("delete_comment", &["author"]),
    ("transfer", &["from", "to"]),
    ("transfer_to_vesting", &["from", "to"]),
    ("withdraw_vesting", &["account"]),
    ("set_withdraw_vesting_route", &["from_account", "to_account"]),
    ("limit_order_create", &["owner"]),
    ("limit_order_create2", &["owner"]),
    ("limit_order_cancel", &["owner"]),
    ("feed_publish", &["publisher"]),
    ("convert", &["owner"]),
    ("account_create", &["creator", "new_account_name"]),
    ("account_create_with_delegation", &["creator", "new_account_name"]),
    ("claim_account", &["creator"]),
    ("create_claimed_account", &["creator", "new_account_name"]),
    ("account_update", &["account"]),
    ("account_update2", &["account"]),
    ("witness_update", &["owner"]),
    ("witness_set_properties", &["owner"]),
    ("account_witness_vote", &["account", "witness"]),
    ("account_witness_proxy", &["account", "proxy"]),
    ("request_account_recovery", &["recovery_account", "account_to_recover"]),
    ("recover_account", &["account_to_recover"]),
    ("change_recovery_account", &["account_to_recover", "new_recovery_account"]),
    ("escrow_transfer", &["from", "to", "agent"]),
    ("escrow_dispute", &["from", "to", "agent", "who"]),
    ("escrow_release", &["from", "to", "agent", "who", "receiver"]),
    ("escrow_approve", &["from", "to", "agent", "who"]),
    ("transfer_to_savings", &["from", "to"]),
    ("transfer_from_savings", &["from", "to"]),
    ("cancel_transfer_from_savings", &["from"]),
    ("decline_voting_rights", &["account"]),
    ("reset_account", &["reset_account", "account_to_reset"]),
    ("set_reset_account", &["account", "current_reset_account", "reset_account"]),
    ("claim_reward_balance", &["account"]),
    ("claim_reward_balance2", &["account"]),
    ("delegate_vesting_shares", &["delegator", "delegatee"]),
    ("create_proposal", &["creator", "receiver"]),
    ("update_proposal_votes", &["voter"]),
    ("remove_proposal", &["proposal_owner"]),
    // virtual
    ("fill_convert_request", &["owner"]),
    ("author_reward", &["author"]),
    ("curation_reward", &["curator", "comment_author"]),
    ("comment_reward", &["author"]),
    ("liquidity_reward", &["owner"]),
    ("interest", &["owner"]),
    ("fill_vesting_withdraw", &["from_account", "to_account"]),
    ("fill_order", &["current_owner", "open_owner"]),
    ("shutdown_witness", &["owner"]),
    ("fill_transfer_from_savings", &["from", "to"]),
    ("hardfork23", &["account"]),
    ("comment_payout_update", &["author"]),
    ("return_vesting_delegation", &["account"]),
    ("comment_benefactor_reward", &["benefactor", "author"]),
    ("producer_reward", &["producer"]),
    ("proposal_pay", &["receiver"]),
];

fn table() -> &'static HashMap<&'static str, &'static [&'static str]> {
    static TABLE: OnceLock<HashMap<&'static str, &'static [&'static str]>> = OnceLock::new();
    TABLE.get_or_init(|| PARTICIPANT_FIELDS.iter().copied().collect())
}

/// Fields naming participants of `op_type`, or [`FALLBACK_FIELDS`] if unknown.
pub fn participant_fields(op_type: &str) -> &'static [&'static str] {
    table().get(op_type).copied().unwrap_or(FALLBACK_FIELDS)
}

pub fn is_known_type(op_type: &str) -> bool {
    table().contains_key(op_type)
}

/// Accounts involved in an operation, de-duplicated in first-occurrence order.
///
/// Only non-empty string values count.
pub fn extract_participants(op_type: &str, op_data: &Map<String, Value>) -> Vec<String> {
    let mut accounts: Vec<String> = Vec::new();
    for field in participant_fields(op_type) {
        let Some(name) = op_data.get(*field).and_then(Value::as_str) else {
            continue;
        };
        if name.is_empty() || accounts.iter().any(|a| a == name) {
            continue;
        }
        accounts.push(name.to_string());
    }
    accounts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn transfer_yields_sender_then_receiver() {
        let d = data(json!({"from": "alice", "to": "bob", "amount": "1.000 STEEM"}));
        assert_eq!(extract_participants("transfer", &d), vec!["alice", "bob"]);
    }

    #[test]
    fn escrow_release_covers_all_parties() {
        let d = data(json!({
            "from": "a", "to": "b", "agent": "c", "who": "a", "receiver": "b"
        }));
        assert_eq!(extract_participants("escrow_release", &d), vec!["a", "b", "c"]);
    }

    #[test]
    fn self_vote_is_deduplicated() {
        let d = data(json!({"voter": "alice", "author": "alice", "weight": 10000}));
        assert_eq!(extract_participants("vote", &d), vec!["alice"]);
    }

    #[test]
    fn unknown_type_uses_fallback_fields() {
        let d = data(json!({"owner": "carol", "to": "dave", "extra": "x"}));
        assert!(!is_known_type("some_future_op"));
        assert_eq!(extract_participants("some_future_op", &d), vec!["carol", "dave"]);
    }

    #[test]
    fn empty_and_non_string_fields_are_ignored() {
        let d = data(json!({"parent_author": "", "author": "erin"}));
        assert_eq!(extract_participants("comment", &d), vec!["erin"]);

        let d = data(json!({"from": 7, "to": null}));
        assert!(extract_participants("transfer", &d).is_empty());
    }

    #[test]
    fn table_has_no_duplicate_entries() {
        assert_eq!(table().len(), PARTICIPANT_FIELDS.len());
    }
}
