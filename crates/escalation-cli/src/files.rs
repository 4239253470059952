//! Incident file and policy file handling

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use escalation_core::{
    default_policy, EscalationEngine, EscalationPolicy, FixedClock, Incident,
};
use std::path::Path;
use std::sync::Arc;

/// Read a JSON array of incidents
pub fn read_incidents(path: &Path) -> Result<Vec<Incident>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read incidents from {}", path.display()))?;
    let incidents: Vec<Incident> = serde_json::from_str(&text)
        .with_context(|| format!("invalid incident file {}", path.display()))?;
    tracing::debug!(path = %path.display(), count = incidents.len(), "Read incidents");
    Ok(incidents)
}

/// Write incidents as a JSON array, replacing the file in one rename
pub fn write_incidents(path: &Path, incidents: &[Incident]) -> Result<()> {
    let json = serde_json::to_string_pretty(incidents)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    tracing::debug!(path = %path.display(), count = incidents.len(), "Wrote incidents");
    Ok(())
}

/// Built-in policy, or the built-in policy overridden by a TOML file
pub fn load_policy(path: Option<&Path>) -> Result<Arc<EscalationPolicy>> {
    match path {
        Some(path) => Ok(Arc::new(EscalationPolicy::load(path)?)),
        None => Ok(default_policy()),
    }
}

/// Engine over `policy`; pinned to `now` when given, else the wall clock
pub fn build_engine(policy: Arc<EscalationPolicy>, now: Option<DateTime<Utc>>) -> EscalationEngine {
    let engine = EscalationEngine::new(policy);
    match now {
        Some(now) => engine.with_clock(Arc::new(FixedClock::new(now))),
        None => engine,
    }
}
