//! Escalation decision functions
//!
//! Pure predicates and transitions over the reference tables. Nothing here
//! reads the clock; callers pass `now`.

use crate::policy::EscalationPolicy;
use crate::rules::minutes_to_duration;
use crate::types::{HandlerLevel, Priority};
use chrono::{DateTime, Duration, Utc};

/// Tier immediately above `current`, `None` at the terminal tier
#[inline]
#[must_use]
pub fn get_next_handler_level(current: HandlerLevel) -> Option<HandlerLevel> {
    current.next()
}

/// Check if `target` is a legal escalation from `current` for `priority`
///
/// `target` must sit strictly above `current` and no higher than the
/// priority's ceiling.
#[must_use]
pub fn can_escalate_to(
    policy: &EscalationPolicy,
    current: HandlerLevel,
    target: HandlerLevel,
    priority: Priority,
) -> bool {
    let ceiling = policy.rule(priority).max_level;
    target.ordinal() > current.ordinal() && target.ordinal() <= ceiling.ordinal()
}

/// Minutes after which an incident at `current_level` with `priority` is due
///
/// The tighter of the priority delay and the tier's own threshold governs.
#[must_use]
pub fn effective_threshold_minutes(
    policy: &EscalationPolicy,
    current_level: HandlerLevel,
    priority: Priority,
) -> u64 {
    let by_priority = policy.rule(priority).auto_escalate_after_minutes;
    let by_tier = policy.handler(current_level).escalation_threshold_minutes;
    by_priority.min(by_tier)
}

/// [`effective_threshold_minutes`] as a duration, `None` past its range
#[must_use]
pub fn effective_threshold(
    policy: &EscalationPolicy,
    current_level: HandlerLevel,
    priority: Priority,
) -> Option<Duration> {
    minutes_to_duration(effective_threshold_minutes(policy, current_level, priority))
}

/// Check if an incident is due for auto-escalation at `now`
///
/// Elapsed time runs from `last_escalated_at`, or `created_at` if the
/// incident never escalated, and is counted in whole minutes.
#[must_use]
pub fn should_auto_escalate(
    policy: &EscalationPolicy,
    created_at: DateTime<Utc>,
    current_level: HandlerLevel,
    priority: Priority,
    last_escalated_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let base = last_escalated_at.unwrap_or(created_at);
    // negative elapsed time fails the conversion
    let threshold = effective_threshold_minutes(policy, current_level, priority);
    u64::try_from((now - base).num_minutes()).is_ok_and(|elapsed| elapsed >= threshold)
}

/// Instant at which [`should_auto_escalate`] first returns true
///
/// `None` when that instant lies past the range of [`DateTime`].
#[must_use]
pub fn escalation_deadline(
    policy: &EscalationPolicy,
    created_at: DateTime<Utc>,
    current_level: HandlerLevel,
    priority: Priority,
    last_escalated_at: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let base = last_escalated_at.unwrap_or(created_at);
    base.checked_add_signed(effective_threshold(policy, current_level, priority)?)
}
