//! Escalation Core - incident escalation matrix
//!
//! Routes incident reports through four handler tiers and escalates them
//! when they sit unresolved too long:
//! - Handler tiers `USER < WALAS < GA < TOP_MANAGEMENT`
//! - Category → initial tier mapping with a GA fallback
//! - Per-priority auto-escalation delay and tier ceiling
//! - Append-only escalation ledger on every incident
//! - Sweeps producing patches for the persisting backend
//!
//! # Example
//!
//! ```rust
//! use escalation_core::prelude::*;
//!
//! let engine = EscalationEngine::default();
//! let incident = engine.open_incident("r-17", "workshop-tkr", Priority::High);
//! assert_eq!(incident.current_handler, HandlerLevel::Ga);
//!
//! // Nothing is due yet
//! assert!(engine.check_auto_escalation(&incident).is_none());
//!
//! // Operators may escalate up to the priority ceiling
//! let patch = engine
//!     .escalate_report(&incident, EscalationRequest::new(HandlerLevel::TopManagement))
//!     .unwrap();
//! let incident = incident.with_patch(patch);
//! assert_eq!(incident.escalation_history.len(), 1);
//! ```

#![warn(unreachable_pub)]

pub mod clock;
pub mod decision;
pub mod engine;
pub mod error;
pub mod history;
pub mod incident;
pub mod lifecycle;
pub mod policy;
pub mod registry;
pub mod rules;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use decision::{
    can_escalate_to, effective_threshold, effective_threshold_minutes, escalation_deadline,
    get_next_handler_level, should_auto_escalate,
};
pub use engine::{EscalationEngine, EscalationRequest};
pub use error::{EscalationError, LifecycleError, ParseError, PolicyError, StoreError};
pub use history::{EscalationHistory, EscalationHistoryEntry};
pub use incident::{EscalationPatch, Incident};
pub use policy::{default_policy, EscalationPolicy, MAX_THRESHOLD_MINUTES, PolicyFile};
pub use registry::{CategoryMap, HandlerInfo, HandlerRegistry};
pub use rules::{EscalationRule, RuleTable};
pub use store::IncidentStore;
pub use types::{
    EntryId, EscalationReason, HandlerLevel, IncidentId, IncidentStatus, Priority,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the escalation matrix
    pub use crate::{
        EscalationEngine, EscalationError, EscalationHistoryEntry, EscalationPatch,
        EscalationPolicy, EscalationReason, EscalationRequest, HandlerLevel, Incident,
        IncidentId, IncidentStatus, IncidentStore, Priority,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
