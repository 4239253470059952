//! Policy loading from disk and concurrent use of the incident store.

use chrono::Duration;
use escalation_core::prelude::*;
use escalation_core::{PolicyError, StoreError};
use escalation_test_utils::{engine_with, engine_with_policy, test_clock};
use std::io::Write;
use std::sync::Arc;
use std::thread;

#[test]
fn century_long_delays_never_fire_and_keep_a_deadline() {
    let policy = EscalationPolicy::from_toml_str(&format!(
        r#"
[rules.low]
auto_escalate_after_minutes = {max}
max_level = "WALAS"

[handlers.USER]
name = "Reporter"
description = "Self-service"
capabilities = []
escalation_threshold_minutes = {max}
"#,
        max = escalation_core::MAX_THRESHOLD_MINUTES
    ))
    .unwrap();

    let clock = test_clock();
    let engine = engine_with_policy(policy, &clock);
    let incident = engine.open_incident("r-1", "library", Priority::Low);
    let incident = Incident { current_handler: HandlerLevel::User, ..incident };

    clock.advance(Duration::days(365));
    assert!(engine.check_auto_escalation(&incident).is_none());
    assert!(engine.check_all_reports(vec![incident.clone()])[0].escalation_history.is_empty());
    assert!(engine.next_deadline(&incident).is_some());
}

#[test]
fn policy_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[rules.low]
auto_escalate_after_minutes = 60
max_level = "GA"

[categories]
"library" = "WALAS"
"#
    )
    .unwrap();

    let policy = EscalationPolicy::load(file.path()).unwrap();
    assert_eq!(policy.rule(Priority::Low).max_level, HandlerLevel::Ga);

    let clock = test_clock();
    let engine = engine_with_policy(policy, &clock);
    let incident = engine.open_incident("r-1", "library", Priority::Low);
    assert_eq!(incident.current_handler, HandlerLevel::Walas);

    clock.advance(Duration::minutes(60));
    let patch = engine.check_auto_escalation(&incident).unwrap();
    assert_eq!(patch.current_handler, HandlerLevel::Ga);
}

#[test]
fn missing_policy_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EscalationPolicy::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, PolicyError::Io { .. }));
}

#[test]
fn malformed_policy_file_is_toml_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[rules.low\nmax_level = 3").unwrap();
    let err = EscalationPolicy::load(file.path()).unwrap_err();
    assert!(matches!(err, PolicyError::Toml(_)));
}

#[test]
fn concurrent_sweeps_and_manual_escalations_keep_ledger_consistent() {
    let clock = test_clock();
    let engine = engine_with(&clock);
    let store = Arc::new(IncidentStore::new());
    for n in 0..50 {
        store
            .insert(engine.open_incident(format!("r-{n}"), "lost-item", Priority::High))
            .unwrap();
    }
    clock.advance(Duration::hours(3));

    let mut workers = Vec::new();
    for worker in 0..4 {
        let store = Arc::clone(&store);
        let engine = engine.clone();
        workers.push(thread::spawn(move || {
            for n in 0..50 {
                if (n + worker) % 2 == 0 {
                    store.sweep(&engine);
                } else {
                    let id = IncidentId::new(format!("r-{n}"));
                    let current = store.get(&id).unwrap().current_handler;
                    if let Some(target) = current.next() {
                        match store.escalate(&engine, &id, EscalationRequest::new(target)) {
                            Ok(_) | Err(StoreError::Escalation(_)) => {}
                            Err(other) => panic!("unexpected store error: {other}"),
                        }
                    }
                }
            }
        }));
    }
    for w in workers {
        w.join().unwrap();
    }

    for incident in store.list() {
        let history = &incident.escalation_history;
        let mut level = HandlerLevel::User;
        for entry in history {
            assert_eq!(entry.from_level, level);
            assert!(entry.to_level > entry.from_level);
            level = entry.to_level;
        }
        assert_eq!(level, incident.current_handler);
    }
}
