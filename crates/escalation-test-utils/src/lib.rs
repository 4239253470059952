//! Testing utilities for the escalation matrix workspace
//!
//! Shared fixtures, a pinned clock and proptest strategies.

#![allow(missing_docs)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use escalation_core::{
    EscalationEngine, EscalationPolicy, HandlerLevel, Incident, IncidentStatus, Priority,
};
use escalation_core::FixedClock;
use proptest::prelude::*;
use std::sync::Arc;

/// Fixed instant every fixture starts from
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 7, 0, 0).unwrap()
}

pub fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(epoch()))
}

/// Engine over the built-in policy, pinned to `clock`
pub fn engine_with(clock: &Arc<FixedClock>) -> EscalationEngine {
    EscalationEngine::default().with_clock(clock.clone())
}

pub fn engine_with_policy(policy: EscalationPolicy, clock: &Arc<FixedClock>) -> EscalationEngine {
    EscalationEngine::new(Arc::new(policy)).with_clock(clock.clone())
}

/// Incident reported `minutes_ago` before `now`
pub fn incident_aged(
    id: &str,
    handler: HandlerLevel,
    priority: Priority,
    minutes_ago: i64,
    now: DateTime<Utc>,
) -> Incident {
    Incident::new(id, "test", priority, handler, now - Duration::minutes(minutes_ago))
}

pub fn with_status(mut incident: Incident, status: IncidentStatus) -> Incident {
    incident.status = status;
    incident
}

pub fn any_handler_level() -> impl Strategy<Value = HandlerLevel> {
    prop::sample::select(HandlerLevel::ALL.to_vec())
}

pub fn any_priority() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

pub fn any_status() -> impl Strategy<Value = IncidentStatus> {
    prop::sample::select(IncidentStatus::ALL.to_vec())
}
