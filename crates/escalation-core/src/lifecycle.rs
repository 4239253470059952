//! Incident status workflow
//!
//! - pending → in-progress, resolved, closed
//! - in-progress → resolved, closed
//! - resolved → closed, in-progress (reopen)
//! - closed → nothing
//!
//! Closed is final. Status does not touch the handler tier, but resolved
//! and closed incidents never escalate.

use crate::error::LifecycleError;
use crate::types::IncidentStatus::{self, Closed, InProgress, Pending, Resolved};

/// Statuses reachable from `from` in one step
#[must_use]
pub fn allowed_status_transitions(from: IncidentStatus) -> &'static [IncidentStatus] {
    match from {
        Pending => &[InProgress, Resolved, Closed],
        InProgress => &[Resolved, Closed],
        Resolved => &[Closed, InProgress],
        Closed => &[],
    }
}

/// Check a status change against the workflow
///
/// # Errors
/// [`LifecycleError::IllegalTransition`] if `to` is not reachable from `from`.
pub fn validate_status_transition(
    from: IncidentStatus,
    to: IncidentStatus,
) -> Result<(), LifecycleError> {
    if allowed_status_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(LifecycleError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_transitions() {
        assert!(validate_status_transition(Pending, InProgress).is_ok());
        assert!(validate_status_transition(Pending, Closed).is_ok());
        assert!(validate_status_transition(Pending, Pending).is_err());
    }

    #[test]
    fn resolved_can_reopen() {
        assert!(validate_status_transition(Resolved, InProgress).is_ok());
        assert!(validate_status_transition(Resolved, Pending).is_err());
    }

    #[test]
    fn closed_is_final() {
        assert!(allowed_status_transitions(Closed).is_empty());
        for to in IncidentStatus::ALL {
            assert_eq!(
                validate_status_transition(Closed, to),
                Err(LifecycleError::IllegalTransition { from: Closed, to })
            );
        }
    }

    #[test]
    fn nothing_returns_to_pending() {
        for from in IncidentStatus::ALL {
            assert!(!allowed_status_transitions(from).contains(&Pending));
        }
    }
}
