//! Per-priority escalation rules

use crate::types::{HandlerLevel, Priority};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Auto-escalation delay and ceiling for one priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRule {
    /// Minutes without resolution before auto-escalation
    pub auto_escalate_after_minutes: u64,
    /// Highest tier this priority may ever reach
    pub max_level: HandlerLevel,
}

impl EscalationRule {
    /// Create new rule
    #[inline]
    #[must_use]
    pub fn new(auto_escalate_after_minutes: u64, max_level: HandlerLevel) -> Self {
        Self {
            auto_escalate_after_minutes,
            max_level,
        }
    }

    /// Delay as a duration, `None` if it does not fit a [`Duration`]
    #[inline]
    #[must_use]
    pub fn auto_escalate_after(&self) -> Option<Duration> {
        minutes_to_duration(self.auto_escalate_after_minutes)
    }
}

/// Whole minutes as a [`Duration`], `None` past its range
pub(crate) fn minutes_to_duration(minutes: u64) -> Option<Duration> {
    i64::try_from(minutes).ok().and_then(Duration::try_minutes)
}

/// One [`EscalationRule`] per priority, indexed by [`Priority::ordinal`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: [EscalationRule; 4],
}

impl RuleTable {
    /// Create table from per-priority rules, least urgent first
    #[inline]
    #[must_use]
    pub fn new(rules: [EscalationRule; 4]) -> Self {
        Self { rules }
    }

    /// Built-in rules
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new([
            EscalationRule::new(24 * 60, HandlerLevel::Walas),
            EscalationRule::new(12 * 60, HandlerLevel::Ga),
            EscalationRule::new(2 * 60, HandlerLevel::TopManagement),
            EscalationRule::new(30, HandlerLevel::TopManagement),
        ])
    }

    /// Rule for a priority
    #[inline]
    #[must_use]
    pub fn get(&self, priority: Priority) -> &EscalationRule {
        &self.rules[priority.ordinal()]
    }

    /// Replace the rule for one priority
    #[must_use]
    pub fn with_rule(mut self, priority: Priority, rule: EscalationRule) -> Self {
        self.rules[priority.ordinal()] = rule;
        self
    }

    /// Priorities and their rules, least urgent first
    pub fn iter(&self) -> impl Iterator<Item = (Priority, &EscalationRule)> {
        Priority::ALL.into_iter().zip(self.rules.iter())
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules() {
        let table = RuleTable::with_defaults();
        assert_eq!(table.get(Priority::Low).auto_escalate_after_minutes, 1440);
        assert_eq!(table.get(Priority::Medium).max_level, HandlerLevel::Ga);
        assert_eq!(table.get(Priority::High).auto_escalate_after_minutes, 120);
        assert_eq!(table.get(Priority::High).max_level, HandlerLevel::TopManagement);
        assert_eq!(
            table.get(Priority::Emergency).auto_escalate_after(),
            Some(Duration::minutes(30))
        );
    }

    #[test]
    fn with_rule_replaces_one_priority() {
        let table = RuleTable::with_defaults()
            .with_rule(Priority::Low, EscalationRule::new(60, HandlerLevel::Ga));
        assert_eq!(table.get(Priority::Low).max_level, HandlerLevel::Ga);
        assert_eq!(table.get(Priority::Medium).auto_escalate_after_minutes, 720);
    }
}
