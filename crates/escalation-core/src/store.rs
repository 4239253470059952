//! In-memory incident store with atomic patch application
//!
//! A timer-driven sweep and an operator's manual escalation may race on the
//! same incident. Each computes a patch carrying the whole new ledger, so
//! blindly writing both would drop one of the appended entries. The store
//! serialises writes and refuses any patch computed against an older
//! version of the incident ([`StoreError::Conflict`]); the caller recomputes
//! against fresh state.

use crate::engine::{EscalationEngine, EscalationRequest};
use crate::error::{EscalationError, StoreError};
use crate::incident::{EscalationPatch, Incident};
use crate::types::{IncidentId, IncidentStatus};
use indexmap::IndexMap;
use parking_lot::RwLock;

/// Incidents keyed by id, in insertion order
#[derive(Debug, Default)]
pub struct IncidentStore {
    inner: RwLock<IndexMap<IncidentId, Incident>>,
}

impl IncidentStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store holding `incidents`
    pub fn from_incidents(
        incidents: impl IntoIterator<Item = Incident>,
    ) -> Result<Self, StoreError> {
        let store = Self::new();
        for incident in incidents {
            store.insert(incident)?;
        }
        Ok(store)
    }

    /// Add a new incident
    pub fn insert(&self, incident: Incident) -> Result<(), StoreError> {
        let mut guard = self.inner.write();
        if guard.contains_key(&incident.id) {
            return Err(StoreError::AlreadyExists(incident.id));
        }
        guard.insert(incident.id.clone(), incident);
        Ok(())
    }

    /// Snapshot of one incident
    #[must_use]
    pub fn get(&self, id: &IncidentId) -> Option<Incident> {
        self.inner.read().get(id).cloned()
    }

    /// Snapshot of every incident
    #[must_use]
    pub fn list(&self) -> Vec<Incident> {
        self.inner.read().values().cloned().collect()
    }

    /// Number of incidents
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Consume the store, returning incidents in insertion order
    #[must_use]
    pub fn into_incidents(self) -> Vec<Incident> {
        self.inner.into_inner().into_values().collect()
    }

    /// Apply a patch if it was computed against the stored version
    ///
    /// A resolved or closed incident accepts no patch, even one computed
    /// before its status changed.
    pub fn apply_patch(&self, patch: EscalationPatch) -> Result<Incident, StoreError> {
        let mut guard = self.inner.write();
        let current = guard
            .get_mut(&patch.incident_id)
            .ok_or_else(|| StoreError::NotFound(patch.incident_id.clone()))?;

        if current.is_frozen() {
            tracing::warn!(
                incident = %patch.incident_id,
                status = %current.status,
                "Escalation patch for frozen incident rejected"
            );
            return Err(EscalationError::IncidentFrozen {
                id: patch.incident_id,
                status: current.status,
            }
            .into());
        }

        if !patch.applies_to(current) {
            tracing::warn!(incident = %patch.incident_id, "Stale escalation patch rejected");
            return Err(StoreError::Conflict {
                id: patch.incident_id.clone(),
                expected_handler: patch.from_level,
                expected_len: patch.base_history_len,
                found_handler: current.current_handler,
                found_len: current.escalation_history.len(),
            });
        }

        let updated = current.clone().with_patch(patch);
        *current = updated.clone();
        Ok(updated)
    }

    /// Run one auto-escalation sweep over every stored incident
    ///
    /// Holds the write lock for the whole sweep, so no manual escalation
    /// interleaves with it. Returns the ids that escalated.
    pub fn sweep(&self, engine: &EscalationEngine) -> Vec<IncidentId> {
        let now = engine.now();
        let mut guard = self.inner.write();
        let mut escalated = Vec::new();

        for incident in guard.values_mut() {
            if let Some(patch) = engine.auto_patch(incident, now) {
                *incident = incident.clone().with_patch(patch);
                escalated.push(incident.id.clone());
            }
        }

        tracing::info!(checked = guard.len(), escalated = escalated.len(), "Store sweep complete");
        escalated
    }

    /// Manually escalate a stored incident
    pub fn escalate(
        &self,
        engine: &EscalationEngine,
        id: &IncidentId,
        request: EscalationRequest,
    ) -> Result<Incident, StoreError> {
        let mut guard = self.inner.write();
        let incident = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let patch = engine.escalate_report(incident, request)?;
        *incident = incident.clone().with_patch(patch);
        Ok(incident.clone())
    }

    /// Change a stored incident's status
    pub fn set_status(
        &self,
        id: &IncidentId,
        status: IncidentStatus,
    ) -> Result<Incident, StoreError> {
        let mut guard = self.inner.write();
        let incident = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        incident.transition_status(status)?;
        tracing::info!(incident = %id, %status, "Incident status changed");
        Ok(incident.clone())
    }
}
