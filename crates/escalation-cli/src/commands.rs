//! Subcommand implementations

use crate::files::{read_incidents, write_incidents};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use escalation_core::{
    EscalationEngine, EscalationPatch, EscalationPolicy, EscalationRequest, Incident, IncidentId,
    IncidentStatus, IncidentStore, PolicyFile,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// Outcome of one `check` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// Incidents evaluated
    pub checked: usize,
    /// Incidents escalated, in file order
    pub escalated: Vec<IncidentId>,
    /// Earliest upcoming automatic escalation, if any
    pub next_deadline: Option<DateTime<Utc>>,
}

/// Sweep the incident file once, writing results to `output` (or back to `input`)
///
/// In place, the sweep's patches are merged into the file as it stands at
/// write time (see [`merge_patches`]).
pub fn run_check(
    engine: &EscalationEngine,
    input: &Path,
    output: Option<&Path>,
) -> Result<CheckReport> {
    let before = read_incidents(input)?;
    let checked = before.len();

    let (escalated, after) = match output {
        Some(output) => {
            let lengths: Vec<usize> = before.iter().map(|i| i.escalation_history.len()).collect();
            let after = engine.check_all_reports(before);
            let escalated = after
                .iter()
                .zip(lengths)
                .filter(|(incident, len)| incident.escalation_history.len() > *len)
                .map(|(incident, _)| incident.id.clone())
                .collect();
            write_incidents(output, &after)?;
            (escalated, after)
        }
        None => {
            let patches = engine.plan_auto_escalations(&before);
            let escalated = merge_patches(input, patches)?;
            (escalated, read_incidents(input)?)
        }
    };

    let next_deadline = after.iter().filter_map(|i| engine.next_deadline(i)).min();
    Ok(CheckReport {
        checked,
        escalated,
        next_deadline,
    })
}

/// Compute the due automatic escalations of the incident file
pub fn plan_sweep(engine: &EscalationEngine, input: &Path) -> Result<Vec<EscalationPatch>> {
    Ok(engine.plan_auto_escalations(&read_incidents(input)?))
}

/// Apply sweep patches to the file's current contents
///
/// The file is re-read first, so a status change or manual escalation
/// written since the patches were computed is kept. Patches that no longer
/// apply are skipped. Returns the ids that escalated.
pub fn merge_patches(input: &Path, patches: Vec<EscalationPatch>) -> Result<Vec<IncidentId>> {
    if patches.is_empty() {
        return Ok(Vec::new());
    }

    let store = IncidentStore::from_incidents(read_incidents(input)?)?;
    let mut escalated = Vec::new();
    for patch in patches {
        let id = patch.incident_id.clone();
        match store.apply_patch(patch) {
            Ok(_) => escalated.push(id),
            Err(e) => tracing::info!(incident = %id, "Skipped escalation: {e}"),
        }
    }

    if !escalated.is_empty() {
        write_incidents(input, &store.into_incidents())?;
    }
    Ok(escalated)
}

/// Manually escalate one incident in the file
pub fn run_escalate(
    engine: &EscalationEngine,
    input: &Path,
    id: &IncidentId,
    request: EscalationRequest,
) -> Result<Incident> {
    let store = IncidentStore::from_incidents(read_incidents(input)?)?;
    let updated = store
        .escalate(engine, id, request)
        .with_context(|| format!("cannot escalate {id}"))?;
    write_incidents(input, &store.into_incidents())?;
    Ok(updated)
}

/// Change the status of one incident in the file
pub fn run_set_status(input: &Path, id: &IncidentId, status: IncidentStatus) -> Result<Incident> {
    let store = IncidentStore::from_incidents(read_incidents(input)?)?;
    let updated = store
        .set_status(id, status)
        .with_context(|| format!("cannot change status of {id}"))?;
    write_incidents(input, &store.into_incidents())?;
    Ok(updated)
}

/// Render the reference tables as text or JSON
pub fn render_rules(policy: &EscalationPolicy, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&PolicyFile::from(policy))?);
    }

    let mut out = String::new();
    writeln!(out, "Handler tiers")?;
    for (level, info) in policy.handlers().iter() {
        let threshold = if level.is_terminal() {
            "terminal".to_string()
        } else {
            format!("{} min", info.escalation_threshold_minutes)
        };
        writeln!(
            out,
            "  {:<16} {:<18} {:>10}  {}",
            level,
            info.name,
            threshold,
            info.capabilities.join(", ")
        )?;
    }

    writeln!(out, "\nPriority rules")?;
    for (priority, rule) in policy.rules().iter() {
        writeln!(
            out,
            "  {:<10} escalate after {:>5} min, ceiling {}",
            priority, rule.auto_escalate_after_minutes, rule.max_level
        )?;
    }

    writeln!(out, "\nCategories (fallback {})", policy.categories().fallback())?;
    for (category, level) in policy.categories().iter() {
        writeln!(out, "  {category:<18} {level}")?;
    }
    Ok(out)
}

/// Sweep the incident file every `interval` until Ctrl-C
pub async fn run_watch(engine: &EscalationEngine, input: &Path, interval: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    tracing::info!(
        path = %input.display(),
        interval_secs = interval.as_secs(),
        "Watching incident file"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let swept = plan_sweep(engine, input).and_then(|p| merge_patches(input, p));
                if let Err(e) = swept {
                    tracing::error!("Sweep failed: {e:#}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watch");
                return Ok(());
            }
        }
    }
}
