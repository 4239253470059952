//! Handler level registry and category mapping
//!
//! [`HandlerRegistry`] holds the reference data for each tier, stored in
//! tier order. [`CategoryMap`] routes a new incident's category to its
//! initial tier.

use crate::types::HandlerLevel;
use chrono::Duration;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reference data for one handler tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerInfo {
    /// Display name
    pub name: String,
    /// What the tier is responsible for
    pub description: String,
    /// Actions this tier may take
    pub capabilities: Vec<String>,
    /// Minutes an incident may sit with this tier before it escalates.
    /// Zero for the terminal tier.
    pub escalation_threshold_minutes: u64,
}

impl HandlerInfo {
    /// Create new handler info
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        escalation_threshold_minutes: u64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capabilities: Vec::new(),
            escalation_threshold_minutes,
        }
    }

    /// With capabilities
    #[must_use]
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Threshold as a duration, `None` if it does not fit a [`Duration`]
    #[inline]
    #[must_use]
    pub fn escalation_threshold(&self) -> Option<Duration> {
        crate::rules::minutes_to_duration(self.escalation_threshold_minutes)
    }

    /// Check if the tier has a capability
    #[inline]
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// One [`HandlerInfo`] per tier, indexed by [`HandlerLevel::ordinal`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRegistry {
    handlers: [HandlerInfo; 4],
}

impl HandlerRegistry {
    /// Create registry from per-tier info, lowest tier first
    #[inline]
    #[must_use]
    pub fn new(handlers: [HandlerInfo; 4]) -> Self {
        Self { handlers }
    }

    /// Built-in tiers
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new([
            HandlerInfo::new("User", "Reporter resolves the issue directly", 480)
                .with_capabilities(["report", "follow-up", "close-own"]),
            HandlerInfo::new(
                "Wali Kelas",
                "Homeroom teacher responsible for the class involved",
                240,
            )
            .with_capabilities(["review", "assign", "contact-parents"]),
            HandlerInfo::new(
                "General Affairs",
                "Facilities and general affairs staff",
                120,
            )
            .with_capabilities(["review", "assign", "repair", "procure", "coordinate-vendors"]),
            HandlerInfo::new(
                "Top Management",
                "Principal and school leadership; no further escalation",
                0,
            )
            .with_capabilities(["approve-budget", "policy-decision", "external-report"]),
        ])
    }

    /// Info for a tier
    #[inline]
    #[must_use]
    pub fn get(&self, level: HandlerLevel) -> &HandlerInfo {
        &self.handlers[level.ordinal()]
    }

    /// Replace the info for one tier
    #[must_use]
    pub fn with_handler(mut self, level: HandlerLevel, info: HandlerInfo) -> Self {
        self.handlers[level.ordinal()] = info;
        self
    }

    /// Tiers and their info, lowest first
    pub fn iter(&self) -> impl Iterator<Item = (HandlerLevel, &HandlerInfo)> {
        HandlerLevel::ALL.into_iter().zip(self.handlers.iter())
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Tier used for categories nobody mapped
pub const DEFAULT_FALLBACK_LEVEL: HandlerLevel = HandlerLevel::Ga;

/// Category → initial handler tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap {
    mapping: IndexMap<String, HandlerLevel>,
    fallback: HandlerLevel,
}

impl CategoryMap {
    /// Create empty map with the default fallback tier
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            mapping: IndexMap::new(),
            fallback: DEFAULT_FALLBACK_LEVEL,
        }
    }

    /// Built-in school incident categories
    #[must_use]
    pub fn with_defaults() -> Self {
        use HandlerLevel::{Ga, TopManagement, User, Walas};

        let mut map = Self::new();
        for (category, level) in [
            ("lost-item", User),
            ("minor-damage", User),
            ("classroom", Walas),
            ("student-conduct", Walas),
            ("attendance", Walas),
            ("laboratory", Ga),
            ("workshop-tkr", Ga),
            ("workshop-tsm", Ga),
            ("workshop-tkj", Ga),
            ("electrical", Ga),
            ("building", Ga),
            ("sanitation", Ga),
            ("canteen", Ga),
            ("sports-field", Ga),
            ("fire", TopManagement),
            ("security-threat", TopManagement),
            ("serious-injury", TopManagement),
        ] {
            map.insert(category, level);
        }
        map
    }

    /// Map a category, replacing any previous mapping
    pub fn insert(&mut self, category: &str, level: HandlerLevel) {
        self.mapping.insert(normalize(category), level);
    }

    /// With a different fallback tier
    #[inline]
    #[must_use]
    pub fn with_fallback(mut self, fallback: HandlerLevel) -> Self {
        self.fallback = fallback;
        self
    }

    /// Tier for unmapped categories
    #[inline]
    #[must_use]
    pub fn fallback(&self) -> HandlerLevel {
        self.fallback
    }

    /// Mapped tier for a category, if any
    #[inline]
    #[must_use]
    pub fn lookup(&self, category: &str) -> Option<HandlerLevel> {
        self.mapping.get(&normalize(category)).copied()
    }

    /// Initial tier for a category; unknown categories get the fallback
    #[inline]
    #[must_use]
    pub fn get_handler_for_category(&self, category: &str) -> HandlerLevel {
        self.lookup(category).unwrap_or(self.fallback)
    }

    /// Number of mapped categories
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Check if nothing is mapped
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Mappings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, HandlerLevel)> {
        self.mapping.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn normalize(category: &str) -> String {
    category.trim().to_ascii_lowercase()
}
