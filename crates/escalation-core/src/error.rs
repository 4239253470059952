//! Error types for the escalation matrix
//!
//! Only two conditions on the escalation path are errors:
//! - A manual escalation to a target the rules forbid
//! - A manual escalation of an incident that is already resolved or closed
//!
//! "Not yet due", "already at ceiling" and "incident closed" on the
//! automatic path are ordinary `None` outcomes, not errors. The remaining
//! enums cover policy loading, status changes and the incident store.

use crate::types::{HandlerLevel, IncidentId, IncidentStatus, Priority};

/// Errors from manual escalation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscalationError {
    /// Target tier is not above the current tier or exceeds the priority ceiling
    #[error(
        "escalation not allowed: {from} -> {to} for {priority} priority (ceiling {ceiling})"
    )]
    EscalationNotAllowed {
        /// Current handler
        from: HandlerLevel,
        /// Requested handler
        to: HandlerLevel,
        /// Incident priority
        priority: Priority,
        /// Highest tier the priority may reach
        ceiling: HandlerLevel,
    },

    /// Incident is resolved or closed
    #[error("incident {id} is {status}; escalation is frozen")]
    IncidentFrozen {
        /// Incident
        id: IncidentId,
        /// Its terminal status
        status: IncidentStatus,
    },
}

impl EscalationError {
    /// Escalation errors are caller errors; nothing here is worth retrying
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Errors from loading or validating an escalation policy
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Policy file could not be read
    #[error("failed to read policy file {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Policy file is not valid TOML for the policy schema
    #[error("invalid policy file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Unknown handler level name
    #[error("unknown handler level: {0}")]
    UnknownLevel(String),

    /// Unknown priority name
    #[error("unknown priority: {0}")]
    UnknownPriority(String),

    /// Threshold inconsistent with the tier or rule it belongs to
    #[error("invalid threshold for {subject}: {reason}")]
    InvalidThreshold {
        /// Tier or priority the threshold belongs to
        subject: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Errors from incident status changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Status transition not in the workflow table
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        /// Current status
        from: IncidentStatus,
        /// Requested status
        to: IncidentStatus,
    },
}

/// Errors from the in-memory incident store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No incident with this id
    #[error("incident not found: {0}")]
    NotFound(IncidentId),

    /// An incident with this id already exists
    #[error("incident already exists: {0}")]
    AlreadyExists(IncidentId),

    /// Patch was computed against an older version of the incident
    #[error("stale patch for {id}: expected {expected_handler} with {expected_len} entries, found {found_handler} with {found_len}")]
    Conflict {
        /// Incident
        id: IncidentId,
        /// Handler the patch was computed from
        expected_handler: HandlerLevel,
        /// History length the patch was computed from
        expected_len: usize,
        /// Handler currently stored
        found_handler: HandlerLevel,
        /// History length currently stored
        found_len: usize,
    },

    /// Manual escalation rejected
    #[error(transparent)]
    Escalation(#[from] EscalationError),

    /// Status change rejected
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl StoreError {
    /// Only a conflict can succeed when recomputed against fresh state
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Failure to parse one of the enumerations from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseError {
    /// What was being parsed
    pub kind: &'static str,
    /// Offending input
    pub value: String,
}

impl ParseError {
    /// Create new parse error
    #[inline]
    #[must_use]
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_errors_never_retry() {
        let err = EscalationError::EscalationNotAllowed {
            from: HandlerLevel::Ga,
            to: HandlerLevel::User,
            priority: Priority::High,
            ceiling: HandlerLevel::TopManagement,
        };
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "escalation not allowed: GA -> USER for high priority (ceiling TOP_MANAGEMENT)"
        );
    }

    #[test]
    fn store_conflict_is_retryable() {
        let conflict = StoreError::Conflict {
            id: IncidentId::new("r-1"),
            expected_handler: HandlerLevel::User,
            expected_len: 0,
            found_handler: HandlerLevel::Walas,
            found_len: 1,
        };
        assert!(conflict.is_retryable());
        assert!(!StoreError::NotFound(IncidentId::new("r-1")).is_retryable());
    }
}
