//! Message rendering for notifications.
//!
//! Templates use fixed placeholders: `{{.Account}}`, `{{.OpType}}`,
//! `{{.BlockNum}}`, `{{.Timestamp}}` and `{{.Details}}`.

use crate::models::Operation;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt::Write;

/// Fields never shown in message details.
pub const HIDDEN_FIELDS: &[&str] = &["memo", "json_metadata"];

/// Longest detail value, in characters, before truncation.
pub const MAX_VALUE_CHARS: usize = 100;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(s: String) -> String {
    if s.chars().count() <= MAX_VALUE_CHARS {
        return s;
    }
    let mut cut: String = s.chars().take(MAX_VALUE_CHARS).collect();
    cut.push_str("...");
    cut
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// One bullet line per visible `op_data` field, in key order.
pub fn format_details(op_data: &Map<String, Value>) -> String {
    let mut out = String::new();
    for (key, value) in op_data {
        if HIDDEN_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let text = escape_html(&truncate(value_to_text(value)));
        let _ = writeln!(out, "  • <b>{}:</b> <code>{}</code>", key, text);
    }
    out
}

/// The built-in layout used when neither rule nor global template is set.
pub fn render_default(op: &Operation) -> String {
    let mut out = String::new();
    out.push_str("<b>🔔 New Operation</b>\n\n");
    let _ = writeln!(out, "<b>Account:</b> <code>{}</code>", op.account);
    let _ = writeln!(out, "<b>Type:</b> <code>{}</code>", op.op_type);
    let _ = writeln!(out, "<b>Block:</b> <code>{}</code>", op.block_num);
    let _ = writeln!(out, "<b>Time:</b> <code>{}</code>\n", format_timestamp(&op.timestamp));
    out.push_str("<b>Details:</b>\n");
    out.push_str(&format_details(&op.op_data));
    out
}

pub fn render_template(template: &str, op: &Operation) -> String {
    let mut details = format_details(&op.op_data);
    if details.is_empty() {
        details = "  (no details)".to_string();
    }

    template
        .replace("{{.Account}}", &op.account)
        .replace("{{.OpType}}", &op.op_type)
        .replace("{{.BlockNum}}", &op.block_num.to_string())
        .replace("{{.Timestamp}}", &format_timestamp(&op.timestamp))
        .replace("{{.Details}}", &details)
}

/// Render with the first template available: rule, then global, then built-in.
pub fn render(rule_template: Option<&str>, global_template: Option<&str>, op: &Operation) -> String {
    match rule_template.or(global_template) {
        Some(template) => render_template(template, op),
        None => render_default(op),
    }
}
