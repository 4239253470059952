//! File-backed command tests.

use chrono::Duration;
use escalation_cli::{
    build_engine, load_policy, merge_patches, plan_sweep, read_incidents, run_check,
    run_escalate, run_set_status, write_incidents,
};
use escalation_core::prelude::*;
use escalation_test_utils::{epoch, incident_aged};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn seed(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("incidents.json");
    let now = epoch();
    write_incidents(
        &path,
        &[
            incident_aged("r-1", HandlerLevel::User, Priority::Emergency, 31, now),
            incident_aged("r-2", HandlerLevel::Ga, Priority::Medium, 600, now),
            incident_aged("r-3", HandlerLevel::Walas, Priority::High, 10, now),
        ],
    )
    .unwrap();
    path
}

#[test]
fn check_escalates_due_incidents_and_rewrites_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir);
    let engine = build_engine(load_policy(None).unwrap(), Some(epoch()));

    let report = run_check(&engine, &path, None).unwrap();
    assert_eq!(report.checked, 3);
    assert_eq!(report.escalated, vec![IncidentId::new("r-1")]);
    // r-1 now at WALAS (due 30 min later), r-3 due 110 min from now
    assert_eq!(report.next_deadline, Some(epoch() + Duration::minutes(30)));

    let stored = read_incidents(&path).unwrap();
    assert_eq!(stored[0].current_handler, HandlerLevel::Walas);
    assert_eq!(stored[1].current_handler, HandlerLevel::Ga);

    let again = run_check(&engine, &path, None).unwrap();
    assert!(again.escalated.is_empty());
}

#[test]
fn check_can_write_elsewhere() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir);
    let out = dir.path().join("out.json");
    let engine = build_engine(load_policy(None).unwrap(), Some(epoch()));

    run_check(&engine, &path, Some(&out)).unwrap();
    assert_eq!(read_incidents(&path).unwrap()[0].current_handler, HandlerLevel::User);
    assert_eq!(read_incidents(&out).unwrap()[0].current_handler, HandlerLevel::Walas);
}

#[test]
fn escalate_rejects_ceiling_and_leaves_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir);
    let before = std::fs::read_to_string(&path).unwrap();
    let engine = build_engine(load_policy(None).unwrap(), Some(epoch()));

    let err = run_escalate(
        &engine,
        &path,
        &IncidentId::new("r-2"),
        EscalationRequest::new(HandlerLevel::TopManagement),
    )
    .unwrap_err();
    assert!(err.to_string().contains("cannot escalate r-2"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn escalate_then_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir);
    let engine = build_engine(load_policy(None).unwrap(), Some(epoch()));
    let id = IncidentId::new("r-3");

    let updated = run_escalate(
        &engine,
        &path,
        &id,
        EscalationRequest::new(HandlerLevel::TopManagement).escalated_by("kepala.sekolah"),
    )
    .unwrap();
    assert_eq!(updated.current_handler, HandlerLevel::TopManagement);

    let closed = run_set_status(&path, &id, IncidentStatus::Closed).unwrap();
    assert_eq!(closed.status, IncidentStatus::Closed);
    assert!(run_set_status(&path, &id, IncidentStatus::InProgress).is_err());

    let stored = read_incidents(&path).unwrap();
    assert_eq!(stored[2].escalation_history.len(), 1);
    assert_eq!(stored[2].status, IncidentStatus::Closed);
}

#[test]
fn sweep_keeps_status_change_written_mid_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir);
    let engine = build_engine(load_policy(None).unwrap(), Some(epoch()));
    let id = IncidentId::new("r-1");

    let patches = plan_sweep(&engine, &path).unwrap();
    assert_eq!(patches.len(), 1);
    run_set_status(&path, &id, IncidentStatus::Closed).unwrap();

    assert!(merge_patches(&path, patches).unwrap().is_empty());
    let stored = read_incidents(&path).unwrap();
    assert_eq!(stored[0].status, IncidentStatus::Closed);
    assert_eq!(stored[0].current_handler, HandlerLevel::User);
    assert!(stored[0].escalation_history.is_empty());
}

#[test]
fn sweep_keeps_manual_escalation_written_mid_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir);
    let engine = build_engine(load_policy(None).unwrap(), Some(epoch()));

    let patches = plan_sweep(&engine, &path).unwrap();
    run_escalate(
        &engine,
        &path,
        &IncidentId::new("r-3"),
        EscalationRequest::new(HandlerLevel::TopManagement),
    )
    .unwrap();

    assert_eq!(merge_patches(&path, patches).unwrap(), vec![IncidentId::new("r-1")]);
    let stored = read_incidents(&path).unwrap();
    assert_eq!(stored[0].current_handler, HandlerLevel::Walas);
    assert_eq!(stored[2].current_handler, HandlerLevel::TopManagement);
    assert_eq!(stored[2].escalation_history.len(), 1);
}

#[test]
fn sweep_skips_patch_made_stale_by_manual_escalation() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir);
    let engine = build_engine(load_policy(None).unwrap(), Some(epoch()));
    let id = IncidentId::new("r-1");

    let patches = plan_sweep(&engine, &path).unwrap();
    run_escalate(&engine, &path, &id, EscalationRequest::new(HandlerLevel::Ga)).unwrap();

    assert!(merge_patches(&path, patches).unwrap().is_empty());
    let stored = read_incidents(&path).unwrap();
    assert_eq!(stored[0].current_handler, HandlerLevel::Ga);
    assert_eq!(stored[0].escalation_history.len(), 1);
}
