//! Core types for the escalation matrix
//!
//! Defines the enumerations every other module is keyed on:
//! - Handler tiers and their total order
//! - Incident priorities and statuses
//! - Escalation reasons
//! - Incident and ledger-entry identifiers

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Handler tier responsible for an incident.
///
/// Tiers are totally ordered by organizational authority:
/// `User < Walas < Ga < TopManagement`. The order is the one listed in
/// [`HandlerLevel::ALL`]; the derived `Ord` agrees with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandlerLevel {
    /// The reporting user handles the issue themself
    User,
    /// Homeroom teacher (wali kelas)
    Walas,
    /// General affairs / facilities staff
    Ga,
    /// School leadership; terminal tier
    TopManagement,
}

impl HandlerLevel {
    /// Every tier, lowest authority first
    pub const ALL: [HandlerLevel; 4] = [
        HandlerLevel::User,
        HandlerLevel::Walas,
        HandlerLevel::Ga,
        HandlerLevel::TopManagement,
    ];

    /// Position in [`HandlerLevel::ALL`]
    #[inline]
    #[must_use]
    pub fn ordinal(self) -> usize {
        match self {
            HandlerLevel::User => 0,
            HandlerLevel::Walas => 1,
            HandlerLevel::Ga => 2,
            HandlerLevel::TopManagement => 3,
        }
    }

    /// Tier immediately above this one, `None` for the terminal tier
    #[inline]
    #[must_use]
    pub fn next(self) -> Option<HandlerLevel> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    /// Check if no tier sits above this one
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Wire name (`USER`, `WALAS`, `GA`, `TOP_MANAGEMENT`)
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HandlerLevel::User => "USER",
            HandlerLevel::Walas => "WALAS",
            HandlerLevel::Ga => "GA",
            HandlerLevel::TopManagement => "TOP_MANAGEMENT",
        }
    }
}

impl fmt::Display for HandlerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for HandlerLevel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| ParseError::new("handler level", s))
    }
}

/// Incident priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
    /// Emergency
    Emergency,
}

impl Priority {
    /// Every priority, least urgent first
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Emergency,
    ];

    /// Position in [`Priority::ALL`]
    #[inline]
    #[must_use]
    pub fn ordinal(self) -> usize {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Emergency => 3,
        }
    }

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Emergency => "emergency",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| ParseError::new("priority", s))
    }
}

/// Incident workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncidentStatus {
    /// Reported, nobody working on it yet
    #[default]
    Pending,
    /// Being worked on
    InProgress,
    /// Fixed, awaiting closure
    Resolved,
    /// Closed for good
    Closed,
}

impl IncidentStatus {
    /// Every status in workflow order
    pub const ALL: [IncidentStatus; 4] = [
        IncidentStatus::Pending,
        IncidentStatus::InProgress,
        IncidentStatus::Resolved,
        IncidentStatus::Closed,
    ];

    /// Resolved and closed incidents never escalate
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::Closed)
    }

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Pending => "pending",
            IncidentStatus::InProgress => "in-progress",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseError::new("incident status", s))
    }
}

/// Why an escalation happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationReason {
    /// Deadline elapsed, raised by a sweep
    Auto,
    /// Operator action
    Manual,
    /// Operator action citing an external timeout
    Timeout,
}

impl EscalationReason {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EscalationReason::Auto => "auto",
            EscalationReason::Manual => "manual",
            EscalationReason::Timeout => "timeout",
        }
    }
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EscalationReason {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(EscalationReason::Auto),
            "manual" => Ok(EscalationReason::Manual),
            "timeout" => Ok(EscalationReason::Timeout),
            _ => Err(ParseError::new("escalation reason", s)),
        }
    }
}

/// Incident identifier, assigned by the persisting backend
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub String);

impl IncidentId {
    /// Create from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as `&str`
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for IncidentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IncidentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Escalation ledger entry identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub Ulid);

impl EntryId {
    /// Generate new entry ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
