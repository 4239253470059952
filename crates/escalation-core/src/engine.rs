//! Escalation orchestration
//!
//! [`EscalationEngine`] applies the decision functions to incidents and
//! produces [`EscalationPatch`]es. It never stores incidents itself:
//! persisting a patch and scheduling sweeps belong to the caller (see
//! [`crate::store::IncidentStore`] for an in-process store).
//!
//! # Workflow
//! 1. `open_incident` seeds the handler from the category mapping
//! 2. A recurring sweep calls `check_all_reports` (or
//!    `check_auto_escalation` per incident)
//! 3. Operators call `escalate_report` for manual escalations

use crate::clock::{Clock, SystemClock};
use crate::decision::{
    can_escalate_to, effective_threshold_minutes, escalation_deadline, get_next_handler_level,
    should_auto_escalate,
};
use crate::error::EscalationError;
use crate::history::EscalationHistoryEntry;
use crate::incident::{EscalationPatch, Incident};
use crate::policy::{default_policy, EscalationPolicy};
use crate::types::{EscalationReason, HandlerLevel, IncidentId, Priority};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Operator request to escalate an incident
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationRequest {
    /// Requested handler
    pub target: HandlerLevel,
    /// Reason recorded in the ledger
    pub reason: EscalationReason,
    /// Operator
    pub escalated_by: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
}

impl EscalationRequest {
    /// Manual escalation to `target`
    #[inline]
    #[must_use]
    pub fn new(target: HandlerLevel) -> Self {
        Self {
            target,
            reason: EscalationReason::Manual,
            escalated_by: None,
            notes: None,
        }
    }

    /// With a different reason
    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: EscalationReason) -> Self {
        self.reason = reason;
        self
    }

    /// With operator
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

/// Applies an [`EscalationPolicy`] to incidents
#[derive(Debug, Clone)]
pub struct EscalationEngine {
    policy: Arc<EscalationPolicy>,
    clock: Arc<dyn Clock>,
}

impl EscalationEngine {
    /// Create engine over `policy`, reading the wall clock
    #[inline]
    #[must_use]
    pub fn new(policy: Arc<EscalationPolicy>) -> Self {
        Self {
            policy,
            clock: Arc::new(SystemClock),
        }
    }

    /// With a different clock
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    /// Current time according to the engine's clock
    #[inline]
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Open a new incident routed by its category
    #[must_use]
    pub fn open_incident(
        &self,
        id: impl Into<IncidentId>,
        category: impl Into<String>,
        priority: Priority,
    ) -> Incident {
        let category = category.into();
        let handler = self.policy.get_handler_for_category(&category);
        if self.policy.categories().lookup(&category).is_none() {
            tracing::debug!(
                %category,
                fallback = %handler,
                "Unmapped category, using fallback handler"
            );
        }
        Incident::new(id, category, priority, handler, self.now())
    }

    /// Check if `incident` is past its escalation deadline
    #[must_use]
    pub fn should_auto_escalate(&self, incident: &Incident) -> bool {
        should_auto_escalate(
            &self.policy,
            incident.created_at,
            incident.current_handler,
            incident.priority,
            incident.last_escalated_at,
            self.now(),
        )
    }

    /// When the next automatic escalation of `incident` is due
    ///
    /// `None` when no automatic escalation can ever happen: auto-escalation
    /// disabled, status frozen, the handler already at the priority
    /// ceiling, or a deadline past the calendar range.
    #[must_use]
    pub fn next_deadline(&self, incident: &Incident) -> Option<DateTime<Utc>> {
        if !incident.auto_escalation_enabled || incident.is_frozen() {
            return None;
        }
        let next = get_next_handler_level(incident.current_handler)?;
        if !can_escalate_to(&self.policy, incident.current_handler, next, incident.priority) {
            return None;
        }
        escalation_deadline(
            &self.policy,
            incident.created_at,
            incident.current_handler,
            incident.priority,
            incident.last_escalated_at,
        )
    }

    /// Compute the automatic escalation of `incident`, if one is due
    #[must_use]
    pub fn check_auto_escalation(&self, incident: &Incident) -> Option<EscalationPatch> {
        self.auto_patch(incident, self.now())
    }

    /// Compute a manual escalation of `incident`
    ///
    /// # Errors
    /// - [`EscalationError::IncidentFrozen`] if the incident is resolved or closed
    /// - [`EscalationError::EscalationNotAllowed`] if the target is not above
    ///   the current handler or exceeds the priority ceiling
    pub fn escalate_report(
        &self,
        incident: &Incident,
        request: EscalationRequest,
    ) -> Result<EscalationPatch, EscalationError> {
        if incident.is_frozen() {
            tracing::warn!(
                incident = %incident.id,
                status = %incident.status,
                "Rejected escalation of frozen incident"
            );
            return Err(EscalationError::IncidentFrozen {
                id: incident.id.clone(),
                status: incident.status,
            });
        }

        let from = incident.current_handler;
        if !can_escalate_to(&self.policy, from, request.target, incident.priority) {
            let ceiling = self.policy.rule(incident.priority).max_level;
            tracing::warn!(
                incident = %incident.id,
                %from,
                to = %request.target,
                priority = %incident.priority,
                %ceiling,
                "Rejected escalation"
            );
            return Err(EscalationError::EscalationNotAllowed {
                from,
                to: request.target,
                priority: incident.priority,
                ceiling,
            });
        }

        let mut entry =
            EscalationHistoryEntry::new(from, request.target, request.reason, self.now());
        entry.escalated_by = request.escalated_by;
        entry.notes = request.notes;

        tracing::info!(
            incident = %incident.id,
            %from,
            to = %request.target,
            reason = %request.reason,
            by = entry.escalated_by.as_deref().unwrap_or("-"),
            "Escalated incident"
        );
        Ok(EscalationPatch::for_entry(incident, entry))
    }

    /// Apply automatic escalation across a batch
    ///
    /// Every incident is evaluated against the same instant. Incidents
    /// without a due escalation pass through unchanged.
    #[must_use]
    pub fn check_all_reports(&self, incidents: Vec<Incident>) -> Vec<Incident> {
        let now = self.now();
        let mut escalated = 0usize;
        let checked = incidents.len();

        let result: Vec<Incident> = incidents
            .into_iter()
            .map(|incident| match self.auto_patch(&incident, now) {
                Some(patch) => {
                    escalated += 1;
                    incident.with_patch(patch)
                }
                None => incident,
            })
            .collect();

        tracing::info!(checked, escalated, "Escalation sweep complete");
        result
    }

    /// Compute the due automatic escalations of a batch without applying them
    ///
    /// Every incident is evaluated against the same instant. Patches come
    /// back in input order, ready for [`crate::IncidentStore::apply_patch`].
    #[must_use]
    pub fn plan_auto_escalations(&self, incidents: &[Incident]) -> Vec<EscalationPatch> {
        let now = self.now();
        incidents
            .iter()
            .filter_map(|incident| self.auto_patch(incident, now))
            .collect()
    }

    pub(crate) fn auto_patch(
        &self,
        incident: &Incident,
        now: DateTime<Utc>,
    ) -> Option<EscalationPatch> {
        if !incident.auto_escalation_enabled {
            tracing::debug!(incident = %incident.id, "Auto-escalation disabled");
            return None;
        }
        if incident.is_frozen() {
            tracing::debug!(
                incident = %incident.id,
                status = %incident.status,
                "Escalation frozen"
            );
            return None;
        }

        let from = incident.current_handler;
        if !should_auto_escalate(
            &self.policy,
            incident.created_at,
            from,
            incident.priority,
            incident.last_escalated_at,
            now,
        ) {
            return None;
        }

        let to = get_next_handler_level(from)?;
        if !can_escalate_to(&self.policy, from, to, incident.priority) {
            tracing::debug!(
                incident = %incident.id,
                %from,
                priority = %incident.priority,
                "At priority ceiling"
            );
            return None;
        }

        let threshold = effective_threshold_minutes(&self.policy, from, incident.priority);
        let entry = EscalationHistoryEntry::new(from, to, EscalationReason::Auto, now)
            .with_notes(format!("No resolution within {threshold} minutes"));

        tracing::info!(incident = %incident.id, %from, %to, "Auto-escalated incident");
        Some(EscalationPatch::for_entry(incident, entry))
    }
}

impl Default for EscalationEngine {
    fn default() -> Self {
        Self::new(default_policy())
    }
}
