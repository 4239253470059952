//! Escalation history ledger
//!
//! Each incident owns one [`EscalationHistory`]. The ledger only grows, one
//! entry per transition, in chronological order. [`EscalationHistory::appended`]
//! is its only growth operation and returns a new ledger, so a ledger value
//! you hold never changes under you.

use crate::types::{EntryId, EscalationReason, HandlerLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of one handler transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationHistoryEntry {
    /// Entry identifier
    pub id: EntryId,
    /// Handler before the transition
    pub from_level: HandlerLevel,
    /// Handler after the transition
    pub to_level: HandlerLevel,
    /// Why it happened
    pub reason: EscalationReason,
    /// Operator who escalated; absent for automatic escalations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_by: Option<String>,
    /// When it happened
    pub escalated_at: DateTime<Utc>,
    /// Free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EscalationHistoryEntry {
    /// Create new entry
    #[must_use]
    pub fn new(
        from_level: HandlerLevel,
        to_level: HandlerLevel,
        reason: EscalationReason,
        escalated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            from_level,
            to_level,
            reason,
            escalated_by: None,
            escalated_at,
            notes: None,
        }
    }

    /// With the escalating operator
    #[inline]
    #[must_use]
    pub fn escalated_by(mut self, who: impl Into<String>) -> Self {
        self.escalated_by = Some(who.into());
        self
    }

    /// With notes
    #[inline]
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Append-only list of transitions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EscalationHistory(Vec<EscalationHistoryEntry>);

impl EscalationHistory {
    /// Empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// New ledger with `entry` after every existing entry
    #[must_use]
    pub fn appended(&self, entry: EscalationHistoryEntry) -> Self {
        let mut entries = Vec::with_capacity(self.0.len() + 1);
        entries.extend_from_slice(&self.0);
        entries.push(entry);
        Self(entries)
    }

    /// Number of transitions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the incident never escalated
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent transition
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&EscalationHistoryEntry> {
        self.0.last()
    }

    /// Entries, oldest first
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, EscalationHistoryEntry> {
        self.0.iter()
    }

    /// Entries as a slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[EscalationHistoryEntry] {
        &self.0
    }

    /// Check if `prefix` is this ledger's beginning
    #[must_use]
    pub fn extends(&self, prefix: &EscalationHistory) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl<'a> IntoIterator for &'a EscalationHistory {
    type Item = &'a EscalationHistoryEntry;
    type IntoIter = std::slice::Iter<'a, EscalationHistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(from: HandlerLevel, to: HandlerLevel) -> EscalationHistoryEntry {
        EscalationHistoryEntry::new(from, to, EscalationReason::Auto, Utc::now())
    }

    #[test]
    fn appended_leaves_original_untouched() {
        let empty = EscalationHistory::new();
        let one = empty.appended(entry(HandlerLevel::User, HandlerLevel::Walas));

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert!(one.extends(&empty));
    }

    #[test]
    fn appended_keeps_order() {
        let first = entry(HandlerLevel::User, HandlerLevel::Walas);
        let second = entry(HandlerLevel::Walas, HandlerLevel::Ga);
        let ledger = EscalationHistory::new()
            .appended(first.clone())
            .appended(second.clone());

        let entries: Vec<_> = ledger.iter().cloned().collect();
        assert_eq!(entries, vec![first, second.clone()]);
        assert_eq!(ledger.last(), Some(&second));
    }

    #[test]
    fn entry_builder() {
        let e = entry(HandlerLevel::Ga, HandlerLevel::TopManagement)
            .escalated_by("pak.budi")
            .with_notes("roof leak over lab 2");
        assert_eq!(e.escalated_by.as_deref(), Some("pak.budi"));
        assert_eq!(e.notes.as_deref(), Some("roof leak over lab 2"));
    }

    #[test]
    fn entry_wire_format() {
        let e = entry(HandlerLevel::Ga, HandlerLevel::TopManagement);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["fromLevel"], "GA");
        assert_eq!(json["toLevel"], "TOP_MANAGEMENT");
        assert_eq!(json["reason"], "auto");
        assert!(json.get("escalatedBy").is_none());
    }
}
