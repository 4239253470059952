//! Escalation policy: the three reference tables as one configuration value
//!
//! A policy is built once (from the built-in tables, optionally overridden
//! by a TOML file) and shared read-only afterwards.
//!
//! ```toml
//! fallback_handler = "GA"
//!
//! [handlers.WALAS]
//! name = "Wali Kelas"
//! description = "Homeroom teacher"
//! capabilities = ["review", "assign"]
//! escalation_threshold_minutes = 180
//!
//! [rules.medium]
//! auto_escalate_after_minutes = 600
//! max_level = "GA"
//!
//! [categories]
//! "workshop-tkr" = "GA"
//! ```

use crate::error::PolicyError;
use crate::registry::{CategoryMap, HandlerInfo, HandlerRegistry};
use crate::rules::{EscalationRule, RuleTable};
use crate::types::{HandlerLevel, Priority};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

static DEFAULT_POLICY: Lazy<Arc<EscalationPolicy>> =
    Lazy::new(|| Arc::new(EscalationPolicy::with_defaults()));

/// Shared built-in policy, initialised on first use
#[must_use]
pub fn default_policy() -> Arc<EscalationPolicy> {
    Arc::clone(&DEFAULT_POLICY)
}

/// Upper bound on any threshold or rule delay: one hundred years
pub const MAX_THRESHOLD_MINUTES: u64 = 100 * 365 * 24 * 60;

/// Handler registry, category mapping and rule table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EscalationPolicy {
    handlers: HandlerRegistry,
    categories: CategoryMap,
    rules: RuleTable,
}

impl EscalationPolicy {
    /// Create policy from its tables, validating thresholds
    pub fn new(
        handlers: HandlerRegistry,
        categories: CategoryMap,
        rules: RuleTable,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            handlers,
            categories,
            rules,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Built-in tables
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            handlers: HandlerRegistry::with_defaults(),
            categories: CategoryMap::with_defaults(),
            rules: RuleTable::with_defaults(),
        }
    }

    /// Load built-in tables overridden by a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let policy = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "Loaded escalation policy");
        Ok(policy)
    }

    /// Built-in tables overridden by TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, PolicyError> {
        let file: PolicyFile = toml::from_str(text)?;
        file.into_policy()
    }

    /// Handler registry
    #[inline]
    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Category mapping
    #[inline]
    #[must_use]
    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    /// Rule table
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Info for a tier
    #[inline]
    #[must_use]
    pub fn handler(&self, level: HandlerLevel) -> &HandlerInfo {
        self.handlers.get(level)
    }

    /// Rule for a priority
    #[inline]
    #[must_use]
    pub fn rule(&self, priority: Priority) -> &EscalationRule {
        self.rules.get(priority)
    }

    /// Initial tier for a category
    #[inline]
    #[must_use]
    pub fn get_handler_for_category(&self, category: &str) -> HandlerLevel {
        self.categories.get_handler_for_category(category)
    }

    /// Check threshold consistency
    ///
    /// The terminal tier must have threshold 0; every other tier and every
    /// rule needs a positive delay, otherwise one sweep after another would
    /// keep escalating without any time passing. No delay may exceed
    /// [`MAX_THRESHOLD_MINUTES`].
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (level, info) in self.handlers.iter() {
            match (level.is_terminal(), info.escalation_threshold_minutes) {
                (true, 0) | (false, 1..=MAX_THRESHOLD_MINUTES) => {}
                (false, 1..) => {
                    return Err(PolicyError::InvalidThreshold {
                        subject: level.to_string(),
                        reason: "threshold exceeds the maximum",
                    })
                }
                (true, _) => {
                    return Err(PolicyError::InvalidThreshold {
                        subject: level.to_string(),
                        reason: "terminal tier must have threshold 0",
                    })
                }
                (false, 0) => {
                    return Err(PolicyError::InvalidThreshold {
                        subject: level.to_string(),
                        reason: "non-terminal tier needs a positive threshold",
                    })
                }
            }
        }
        for (priority, rule) in self.rules.iter() {
            let reason = match rule.auto_escalate_after_minutes {
                1..=MAX_THRESHOLD_MINUTES => continue,
                0 => "auto_escalate_after_minutes must be positive",
                _ => "auto_escalate_after_minutes exceeds the maximum",
            };
            return Err(PolicyError::InvalidThreshold {
                subject: priority.to_string(),
                reason,
            });
        }
        Ok(())
    }
}

/// On-disk policy layout; every section is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyFile {
    /// Tier for unmapped categories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_handler: Option<String>,
    /// Drop the built-in categories before applying `categories`
    pub replace_categories: bool,
    /// Tier name → info
    pub handlers: IndexMap<String, HandlerInfo>,
    /// Priority name → rule
    pub rules: IndexMap<String, RuleEntry>,
    /// Category → tier name
    pub categories: IndexMap<String, String>,
}

/// Rule as written in a policy file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Minutes before auto-escalation
    pub auto_escalate_after_minutes: u64,
    /// Ceiling tier name
    pub max_level: String,
}

impl PolicyFile {
    /// Apply the file on top of the built-in tables
    pub fn into_policy(self) -> Result<EscalationPolicy, PolicyError> {
        let mut handlers = HandlerRegistry::with_defaults();
        for (name, info) in self.handlers {
            handlers = handlers.with_handler(parse_level(&name)?, info);
        }

        let mut rules = RuleTable::with_defaults();
        for (name, entry) in self.rules {
            let priority: Priority = name
                .parse()
                .map_err(|_| PolicyError::UnknownPriority(name.clone()))?;
            let rule = EscalationRule::new(
                entry.auto_escalate_after_minutes,
                parse_level(&entry.max_level)?,
            );
            rules = rules.with_rule(priority, rule);
        }

        let mut categories = if self.replace_categories {
            CategoryMap::new()
        } else {
            CategoryMap::with_defaults()
        };
        if let Some(fallback) = self.fallback_handler {
            categories = categories.with_fallback(parse_level(&fallback)?);
        }
        for (category, level) in self.categories {
            categories.insert(&category, parse_level(&level)?);
        }

        EscalationPolicy::new(handlers, categories, rules)
    }
}

impl From<&EscalationPolicy> for PolicyFile {
    fn from(policy: &EscalationPolicy) -> Self {
        Self {
            fallback_handler: Some(policy.categories.fallback().to_string()),
            replace_categories: true,
            handlers: policy
                .handlers
                .iter()
                .map(|(level, info)| (level.to_string(), info.clone()))
                .collect(),
            rules: policy
                .rules
                .iter()
                .map(|(priority, rule)| {
                    (
                        priority.to_string(),
                        RuleEntry {
                            auto_escalate_after_minutes: rule.auto_escalate_after_minutes,
                            max_level: rule.max_level.to_string(),
                        },
                    )
                })
                .collect(),
            categories: policy
                .categories
                .iter()
                .map(|(category, level)| (category.to_string(), level.to_string()))
                .collect(),
        }
    }
}

fn parse_level(name: &str) -> Result<HandlerLevel, PolicyError> {
    name.parse()
        .map_err(|_| PolicyError::UnknownLevel(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_policy_is_valid() {
        assert!(EscalationPolicy::with_defaults().validate().is_ok());
        assert_eq!(*default_policy(), EscalationPolicy::with_defaults());
    }

    #[test]
    fn empty_file_is_built_in_policy() {
        let policy = EscalationPolicy::from_toml_str("").unwrap();
        assert_eq!(policy, EscalationPolicy::with_defaults());
    }

    #[test]
    fn overrides_apply() {
        let policy = EscalationPolicy::from_toml_str(
            r#"
            fallback_handler = "WALAS"

            [rules.medium]
            auto_escalate_after_minutes = 600
            max_level = "TOP_MANAGEMENT"

            [categories]
            "Library" = "USER"
            "#,
        )
        .unwrap();

        assert_eq!(policy.rule(Priority::Medium).auto_escalate_after_minutes, 600);
        assert_eq!(policy.rule(Priority::Medium).max_level, HandlerLevel::TopManagement);
        assert_eq!(policy.get_handler_for_category("library"), HandlerLevel::User);
        assert_eq!(policy.get_handler_for_category("workshop-tkr"), HandlerLevel::Ga);
        assert_eq!(policy.get_handler_for_category("unknown"), HandlerLevel::Walas);
    }

    #[test]
    fn replace_categories_drops_built_ins() {
        let policy = EscalationPolicy::from_toml_str(
            r#"
            replace_categories = true
            [categories]
            "fire" = "GA"
            "#,
        )
        .unwrap();
        assert_eq!(policy.categories().len(), 1);
        assert_eq!(policy.get_handler_for_category("fire"), HandlerLevel::Ga);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = EscalationPolicy::from_toml_str(
            r#"
            [rules.urgent]
            auto_escalate_after_minutes = 10
            max_level = "GA"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownPriority(p) if p == "urgent"));

        let err = EscalationPolicy::from_toml_str(
            r#"
            [categories]
            "fire" = "PRINCIPAL"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownLevel(l) if l == "PRINCIPAL"));
    }

    #[test]
    fn rejects_zero_threshold_on_open_tier() {
        let err = EscalationPolicy::from_toml_str(
            r#"
            [handlers.GA]
            name = "General Affairs"
            description = "Facilities"
            capabilities = []
            escalation_threshold_minutes = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidThreshold { .. }));
    }

    #[test]
    fn rejects_threshold_on_terminal_tier() {
        let handlers = HandlerRegistry::with_defaults().with_handler(
            HandlerLevel::TopManagement,
            HandlerInfo::new("Top Management", "Leadership", 60),
        );
        let err = EscalationPolicy::new(handlers, CategoryMap::default(), RuleTable::default())
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidThreshold { .. }));
    }

    #[test]
    fn rejects_zero_rule_delay() {
        let rules = RuleTable::with_defaults()
            .with_rule(Priority::High, EscalationRule::new(0, HandlerLevel::Ga));
        let err = EscalationPolicy::new(HandlerRegistry::default(), CategoryMap::default(), rules)
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidThreshold { .. }));
    }

    #[test]
    fn rejects_delays_beyond_maximum() {
        let err = EscalationPolicy::from_toml_str(
            r#"
            [rules.low]
            auto_escalate_after_minutes = 1000000000000000
            max_level = "WALAS"
            "#,
        )
        .unwrap_err();
        assert!(
            matches!(err, PolicyError::InvalidThreshold { ref subject, .. } if subject == "low")
        );

        let err = EscalationPolicy::from_toml_str(
            r#"
            [handlers.USER]
            name = "Reporter"
            description = "Self-service"
            capabilities = []
            escalation_threshold_minutes = 1000000000000
            "#,
        )
        .unwrap_err();
        assert!(
            matches!(err, PolicyError::InvalidThreshold { ref subject, .. } if subject == "USER")
        );
    }

    #[test]
    fn accepts_delay_at_maximum() {
        let rules = RuleTable::with_defaults().with_rule(
            Priority::Low,
            EscalationRule::new(MAX_THRESHOLD_MINUTES, HandlerLevel::Walas),
        );
        let handlers = HandlerRegistry::with_defaults().with_handler(
            HandlerLevel::User,
            HandlerInfo::new("Reporter", "Self-service", MAX_THRESHOLD_MINUTES),
        );
        assert!(EscalationPolicy::new(handlers, CategoryMap::default(), rules).is_ok());
    }

    #[test]
    fn policy_file_reproduces_policy() {
        let policy = EscalationPolicy::with_defaults();
        let file = PolicyFile::from(&policy);
        assert_eq!(file.into_policy().unwrap(), policy);
    }
}
