//! Incident record and escalation patches
//!
//! Only the fields the escalation matrix reads or writes are modelled; the
//! persisting backend owns the rest of the report.

use crate::error::LifecycleError;
use crate::history::{EscalationHistory, EscalationHistoryEntry};
use crate::lifecycle::validate_status_transition;
use crate::types::{HandlerLevel, IncidentId, IncidentStatus, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn enabled() -> bool {
    true
}

/// Incident report, escalation-relevant fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Incident identifier
    pub id: IncidentId,
    /// Reported category
    pub category: String,
    /// Priority
    pub priority: Priority,
    /// Workflow status
    #[serde(default)]
    pub status: IncidentStatus,
    /// When the incident was reported
    pub created_at: DateTime<Utc>,
    /// Tier currently handling the incident
    pub current_handler: HandlerLevel,
    /// Person the incident is assigned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// Transitions so far, oldest first
    #[serde(default)]
    pub escalation_history: EscalationHistory,
    /// Time of the most recent transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_escalated_at: Option<DateTime<Utc>>,
    /// Whether sweeps may escalate this incident
    #[serde(default = "enabled")]
    pub auto_escalation_enabled: bool,
}

impl Incident {
    /// Create new pending incident with an empty ledger
    #[must_use]
    pub fn new(
        id: impl Into<IncidentId>,
        category: impl Into<String>,
        priority: Priority,
        current_handler: HandlerLevel,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            priority,
            status: IncidentStatus::Pending,
            created_at,
            current_handler,
            assigned_to: None,
            escalation_history: EscalationHistory::new(),
            last_escalated_at: None,
            auto_escalation_enabled: true,
        }
    }

    /// With assignee
    #[inline]
    #[must_use]
    pub fn assigned_to(mut self, who: impl Into<String>) -> Self {
        self.assigned_to = Some(who.into());
        self
    }

    /// With auto-escalation switched on or off
    #[inline]
    #[must_use]
    pub fn with_auto_escalation(mut self, enabled: bool) -> Self {
        self.auto_escalation_enabled = enabled;
        self
    }

    /// Check if escalation is frozen by status
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to another status, following the workflow table
    pub fn transition_status(&mut self, to: IncidentStatus) -> Result<(), LifecycleError> {
        validate_status_transition(self.status, to)?;
        self.status = to;
        Ok(())
    }

    /// Merge an escalation patch
    #[must_use]
    pub fn with_patch(mut self, patch: EscalationPatch) -> Self {
        self.current_handler = patch.current_handler;
        self.escalation_history = patch.escalation_history;
        self.last_escalated_at = Some(patch.last_escalated_at);
        self
    }
}

/// State change produced by one escalation
///
/// Carries the whole new ledger (old entries plus one) rather than a delta,
/// matching what the REST layer persists. `from_level` and
/// `base_history_len` record the incident version the patch was computed
/// against so a store can refuse to apply it to a newer version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationPatch {
    /// Incident the patch belongs to
    pub incident_id: IncidentId,
    /// Handler before the escalation
    pub from_level: HandlerLevel,
    /// Handler after the escalation
    pub current_handler: HandlerLevel,
    /// Ledger after the escalation
    pub escalation_history: EscalationHistory,
    /// Time of the escalation
    pub last_escalated_at: DateTime<Utc>,
    /// Ledger length the patch was computed from
    pub base_history_len: usize,
}

impl EscalationPatch {
    /// Build the patch that records `entry` on `incident`
    #[must_use]
    pub fn for_entry(incident: &Incident, entry: EscalationHistoryEntry) -> Self {
        Self {
            incident_id: incident.id.clone(),
            from_level: incident.current_handler,
            current_handler: entry.to_level,
            last_escalated_at: entry.escalated_at,
            base_history_len: incident.escalation_history.len(),
            escalation_history: incident.escalation_history.appended(entry),
        }
    }

    /// The entry this patch adds
    #[inline]
    #[must_use]
    pub fn entry(&self) -> Option<&EscalationHistoryEntry> {
        self.escalation_history.last()
    }

    /// Check if the patch was computed against `incident` as it is now
    #[inline]
    #[must_use]
    pub fn applies_to(&self, incident: &Incident) -> bool {
        self.incident_id == incident.id
            && self.from_level == incident.current_handler
            && self.base_history_len == incident.escalation_history.len()
    }
}
