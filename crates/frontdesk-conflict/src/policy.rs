//! Policy engine for strategy preselection
//!
//! Chooses which strategy is shown as selected when an operator opens a
//! conflict. Rules from configuration are matched against the conflict's
//! collection using glob patterns in first-match-wins order.
//!
//! The policy never resolves anything on its own: every conflict still
//! needs an explicit operator decision.

use glob::Pattern;
use tracing::{debug, trace, warn};

use frontdesk_core::{
    config::PreselectRule,
    domain::{ConflictResolutionStrategy, SyncConflict},
};

use crate::error::ConflictError;

fn compile_rule(
    rule: &PreselectRule,
) -> Result<(Pattern, ConflictResolutionStrategy), ConflictError> {
    let invalid = |reason: String| ConflictError::InvalidRule {
        pattern: rule.pattern.clone(),
        reason,
    };
    let pattern = rule.compiled_pattern().map_err(invalid)?;
    let strategy = rule.parsed_strategy().map_err(|e| invalid(e.to_string()))?;

    Ok((pattern, strategy))
}

/// Engine that evaluates preselection rules
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    rules: Vec<(Pattern, ConflictResolutionStrategy)>,
    default_strategy: ConflictResolutionStrategy,
}

impl PolicyEngine {
    /// Creates a PolicyEngine from the default strategy string and a list of rules
    ///
    /// Invalid rules are logged and skipped. An invalid default falls back
    /// to `keep-local`.
    pub fn new(default_strategy: &str, rules: &[PreselectRule]) -> Self {
        let default: ConflictResolutionStrategy = default_strategy.parse().unwrap_or_else(|_| {
            warn!(
                strategy = %default_strategy,
                "Invalid default strategy, preselecting keep-local"
            );
            ConflictResolutionStrategy::KeepLocal
        });

        let compiled_rules: Vec<(Pattern, ConflictResolutionStrategy)> = rules
            .iter()
            .filter_map(|rule| match compile_rule(rule) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    warn!(error = %e, "Skipping invalid preselection rule");
                    None
                }
            })
            .collect();

        debug!(
            rules_count = compiled_rules.len(),
            default = %default,
            "PolicyEngine initialized"
        );

        Self {
            rules: compiled_rules,
            default_strategy: default,
        }
    }

    /// Builds the engine from the `conflicts` section of the configuration
    pub fn from_config(config: &frontdesk_core::config::Config) -> Self {
        Self::new(&config.conflicts.default_strategy, &config.conflicts.rules)
    }

    /// Evaluates the policy for a collection name
    ///
    /// The first rule whose glob matches determines the strategy. If no
    /// rule matches, or there is no collection, returns the default.
    pub fn evaluate(&self, collection: Option<&str>) -> ConflictResolutionStrategy {
        let Some(collection) = collection else {
            return self.default_strategy;
        };

        for (pattern, strategy) in &self.rules {
            if pattern.matches(collection) {
                trace!(
                    collection = %collection,
                    pattern = %pattern,
                    strategy = %strategy,
                    "Preselection rule matched"
                );
                return *strategy;
            }
        }

        trace!(
            collection = %collection,
            default = %self.default_strategy,
            "No preselection rule matched, using default"
        );
        self.default_strategy
    }

    /// Evaluates the policy for a conflict's collection
    pub fn preselect<T>(&self, conflict: &SyncConflict<T>) -> ConflictResolutionStrategy {
        self.evaluate(conflict.collection())
    }

    /// Returns the default strategy
    pub fn default_strategy(&self) -> ConflictResolutionStrategy {
        self.default_strategy
    }

    /// Returns the number of compiled rules
    pub fn rules_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_strategy: ConflictResolutionStrategy::KeepLocal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::domain::ConflictId;
    use serde_json::json;

    fn rule(pattern: &str, strategy: &str) -> PreselectRule {
        PreselectRule {
            pattern: pattern.to_string(),
            strategy: strategy.to_string(),
        }
    }

    #[test]
    fn test_policy_engine_no_rules() {
        let engine = PolicyEngine::new("keep-local", &[]);
        assert_eq!(
            engine.evaluate(Some("rooms")),
            ConflictResolutionStrategy::KeepLocal
        );
        assert_eq!(engine.rules_count(), 0);
    }

    #[test]
    fn test_policy_engine_default_strategy() {
        let engine = PolicyEngine::new("merge", &[]);
        assert_eq!(engine.evaluate(None), ConflictResolutionStrategy::Merge);
    }

    #[test]
    fn test_policy_engine_first_match_wins() {
        let rules = vec![rule("reserv*", "keep-remote"), rule("*", "merge")];
        let engine = PolicyEngine::new("keep-local", &rules);

        assert_eq!(
            engine.evaluate(Some("reservations")),
            ConflictResolutionStrategy::KeepRemote
        );
        assert_eq!(
            engine.evaluate(Some("guests")),
            ConflictResolutionStrategy::Merge
        );
    }

    #[test]
    fn test_policy_engine_no_collection_uses_default() {
        let rules = vec![rule("*", "merge")];
        let engine = PolicyEngine::new("keep-remote", &rules);

        assert_eq!(engine.evaluate(None), ConflictResolutionStrategy::KeepRemote);
    }

    #[test]
    fn test_policy_engine_invalid_rules_skipped() {
        let rules = vec![
            rule("[invalid", "keep-remote"),
            rule("rooms", "keep_both"),
            rule("invoices", "manual"),
        ];

        let engine = PolicyEngine::new("keep-local", &rules);
        assert_eq!(engine.rules_count(), 1);
        assert_eq!(
            engine.evaluate(Some("invoices")),
            ConflictResolutionStrategy::Manual
        );
        assert_eq!(
            engine.evaluate(Some("rooms")),
            ConflictResolutionStrategy::KeepLocal
        );
    }

    #[test]
    fn test_policy_engine_invalid_default() {
        let engine = PolicyEngine::new("garbage", &[]);
        assert_eq!(
            engine.default_strategy(),
            ConflictResolutionStrategy::KeepLocal
        );
    }

    #[test]
    fn test_preselect_uses_conflict_collection() {
        let engine = PolicyEngine::new("keep-local", &[rule("inventory", "merge")]);
        let conflict = SyncConflict::new(ConflictId::new(), json!({}), json!({}))
            .with_collection("inventory");
        let bare = SyncConflict::new(ConflictId::new(), json!({}), json!({}));

        assert_eq!(engine.preselect(&conflict), ConflictResolutionStrategy::Merge);
        assert_eq!(engine.preselect(&bare), ConflictResolutionStrategy::KeepLocal);
    }

    #[test]
    fn test_from_config() {
        let config = frontdesk_core::config::ConfigBuilder::new()
            .conflicts_default_strategy("keep-remote")
            .conflicts_rule("employees", "manual")
            .build();
        let engine = PolicyEngine::from_config(&config);

        assert_eq!(engine.rules_count(), 1);
        assert_eq!(
            engine.evaluate(Some("employees")),
            ConflictResolutionStrategy::Manual
        );
        assert_eq!(
            engine.evaluate(Some("rooms")),
            ConflictResolutionStrategy::KeepRemote
        );
    }

    #[test]
    fn test_compile_rule_agrees_with_config_validation() {
        let config = frontdesk_core::config::ConfigBuilder::new()
            .conflicts_rule("guests", "merge")
            .conflicts_rule("[invalid", "merge")
            .conflicts_rule("", "merge")
            .conflicts_rule("guests", "yolo")
            .build();
        let errors = config.validate();

        for (i, rule) in config.conflicts.rules.iter().enumerate() {
            let prefix = format!("conflicts.rules[{i}].");
            let rejected = errors.iter().any(|e| e.field.starts_with(&prefix));
            assert_eq!(compile_rule(rule).is_err(), rejected, "rule {i}");
        }

        assert!(matches!(
            compile_rule(&rule("", "merge")),
            Err(ConflictError::InvalidRule { .. })
        ));
        let engine = PolicyEngine::from_config(&config);
        assert_eq!(engine.rules_count(), 1);
    }
}
