use crate::config::TelegramConfig;
use crate::models::Operation;
use crate::notify::format::render;
use crate::notify::rules::NotificationRule;
use crate::notify::NotificationSink;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Counts from one [`NotificationRouter::dispatch`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub matched: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Fans persisted operations out to every matching rule.
pub struct NotificationRouter {
    sink: Option<Arc<dyn NotificationSink>>,
    rules: Vec<NotificationRule>,
    global_template: Option<String>,
    concurrency: usize,
}

impl NotificationRouter {
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        rules: Vec<NotificationRule>,
        global_template: Option<String>,
    ) -> Self {
        Self {
            sink: Some(sink),
            rules,
            global_template: global_template.filter(|t| !t.trim().is_empty()),
            concurrency: num_cpus::get().max(1),
        }
    }

    /// A router that never sends anything.
    pub fn disabled() -> Self {
        Self {
            sink: None,
            rules: Vec::new(),
            global_template: None,
            concurrency: 1,
        }
    }

    /// Build from the telegram section, normalizing legacy rule fields.
    pub fn from_config(config: &TelegramConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let (rule_configs, multi_rule) = crate::config::normalize_rules(config);
        debug!(
            "Loaded {} notification rule(s) ({} format)",
            rule_configs.len(),
            if multi_rule { "multi-rule" } else { "legacy" }
        );

        let rules = rule_configs.iter().map(NotificationRule::from).collect();
        let router = Self::new(sink, rules, config.message_template.clone());
        match config.concurrency {
            Some(n) => router.with_concurrency(n),
            None => router,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some() && !self.rules.is_empty()
    }

    pub fn rules(&self) -> &[NotificationRule] {
        &self.rules
    }

    /// Render one message per matching (rule, operation) pair, grouped by
    /// operation in input order.
    pub fn plan(&self, operations: &[Operation]) -> Vec<(String, String)> {
        self.plan_grouped(operations).into_iter().flatten().collect()
    }

    fn plan_grouped(&self, operations: &[Operation]) -> Vec<Vec<(String, String)>> {
        operations
            .iter()
            .map(|op| {
                self.rules
                    .iter()
                    .filter(|rule| rule.matches(op))
                    .map(|rule| {
                        let message = render(
                            rule.message_template.as_deref(),
                            self.global_template.as_deref(),
                            op,
                        );
                        (rule.name.clone(), message)
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|group| !group.is_empty())
            .collect()
    }

    /// Send every matching notification. Operations are delivered in input
    /// order; the messages for one operation (one per matching rule) go out
    /// concurrently. Send failures are logged and counted, never returned.
    pub async fn dispatch(&self, operations: &[Operation]) -> DispatchSummary {
        let Some(sink) = &self.sink else {
            return DispatchSummary::default();
        };

        let mut summary = DispatchSummary::default();
        for group in self.plan_grouped(operations) {
            summary.matched += group.len();

            let results: Vec<bool> = stream::iter(group)
                .map(|(rule_name, message)| {
                    let sink = sink.clone();
                    async move {
                        match sink.send(&message).await {
                            Ok(()) => true,
                            Err(e) => {
                                warn!("Failed to send notification for rule {}: {}", rule_name, e);
                                false
                            }
                        }
                    }
                })
                .buffered(self.concurrency)
                .collect()
                .await;

            let sent = results.iter().filter(|ok| **ok).count();
            summary.sent += sent;
            summary.failed += results.len() - sent;
        }

        if summary.matched > 0 {
            debug!(
                "Dispatched {} notification(s), {} failed",
                summary.sent, summary.failed
            );
        }
        summary
    }
}
