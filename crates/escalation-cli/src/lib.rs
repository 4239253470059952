//! Escalation CLI - file-backed front end for the escalation matrix
//!
//! Incidents live in a JSON array file using the REST layer's field names.
//! Every command reads the file, runs the engine and writes the file back.

pub mod commands;
pub mod files;

pub use commands::{
    merge_patches, plan_sweep, render_rules, run_check, run_escalate, run_set_status, run_watch,
    CheckReport,
};
pub use files::{build_engine, load_policy, read_incidents, write_incidents};
