//! `escalation` command-line entry point

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use escalation_cli::{
    build_engine, load_policy, render_rules, run_check, run_escalate, run_set_status, run_watch,
};
use escalation_core::{
    EscalationReason, EscalationRequest, HandlerLevel, IncidentId, IncidentStatus,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn input_arg() -> Arg {
    Arg::new("input")
        .long("input")
        .short('i')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON file holding an array of incidents")
}

fn policy_arg() -> Arg {
    Arg::new("policy")
        .long("policy")
        .value_parser(value_parser!(PathBuf))
        .help("TOML file overriding the built-in escalation policy")
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .help("Incident id")
}

fn cli() -> Command {
    Command::new("escalation")
        .version(escalation_core::VERSION)
        .about("Incident escalation matrix")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("check")
                .about("Run one auto-escalation sweep over an incident file")
                .arg(input_arg())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write results here instead of back to the input"),
                )
                .arg(policy_arg())
                .arg(
                    Arg::new("now")
                        .long("now")
                        .value_parser(value_parser!(DateTime<Utc>))
                        .help("Evaluate as of this RFC 3339 instant"),
                ),
        )
        .subcommand(
            Command::new("escalate")
                .about("Manually escalate one incident")
                .arg(input_arg())
                .arg(id_arg())
                .arg(
                    Arg::new("to")
                        .long("to")
                        .required(true)
                        .value_parser(|s: &str| s.parse::<HandlerLevel>())
                        .help("Target tier: USER, WALAS, GA or TOP_MANAGEMENT"),
                )
                .arg(
                    Arg::new("reason")
                        .long("reason")
                        .default_value("manual")
                        .value_parser(|s: &str| s.parse::<EscalationReason>())
                        .help("Reason recorded in the ledger: manual or timeout"),
                )
                .arg(Arg::new("by").long("by").help("Operator name"))
                .arg(Arg::new("notes").long("notes").help("Free-text notes"))
                .arg(policy_arg()),
        )
        .subcommand(
            Command::new("status")
                .about("Change the status of one incident")
                .arg(input_arg())
                .arg(id_arg())
                .arg(
                    Arg::new("to")
                        .long("to")
                        .required(true)
                        .value_parser(|s: &str| s.parse::<IncidentStatus>())
                        .help("pending, in-progress, resolved or closed"),
                ),
        )
        .subcommand(
            Command::new("rules")
                .about("Print the escalation policy")
                .arg(policy_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Sweep an incident file periodically until interrupted")
                .arg(input_arg())
                .arg(policy_arg())
                .arg(
                    Arg::new("interval-secs")
                        .long("interval-secs")
                        .default_value("60")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Seconds between sweeps"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn path<'a>(args: &'a ArgMatches, name: &str) -> Option<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
}

fn incident_id(args: &ArgMatches) -> Result<IncidentId> {
    let id = args.get_one::<String>("id").context("--id is required")?;
    Ok(IncidentId::new(id.as_str()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("check", args)) => {
            let policy = load_policy(path(args, "policy").map(PathBuf::as_path))?;
            let now = args.get_one::<DateTime<Utc>>("now").copied();
            let engine = build_engine(policy, now);
            let input = path(args, "input").context("--input is required")?;

            let report = run_check(&engine, input, path(args, "output").map(PathBuf::as_path))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(("escalate", args)) => {
            let policy = load_policy(path(args, "policy").map(PathBuf::as_path))?;
            let engine = build_engine(policy, None);
            let input = path(args, "input").context("--input is required")?;
            let id = incident_id(args)?;
            let target = *args.get_one::<HandlerLevel>("to").context("--to is required")?;

            let mut request = EscalationRequest::new(target);
            if let Some(reason) = args.get_one::<EscalationReason>("reason") {
                request = request.with_reason(*reason);
            }
            if let Some(by) = args.get_one::<String>("by") {
                request = request.escalated_by(by.as_str());
            }
            if let Some(notes) = args.get_one::<String>("notes") {
                request = request.with_notes(notes.as_str());
            }

            let incident = run_escalate(&engine, input, &id, request)?;
            println!("{}", serde_json::to_string_pretty(&incident)?);
        }
        Some(("status", args)) => {
            let input = path(args, "input").context("--input is required")?;
            let id = incident_id(args)?;
            let status = *args.get_one::<IncidentStatus>("to").context("--to is required")?;

            let incident = run_set_status(input, &id, status)?;
            println!("{}", serde_json::to_string_pretty(&incident)?);
        }
        Some(("rules", args)) => {
            let policy = load_policy(path(args, "policy").map(PathBuf::as_path))?;
            print!("{}", render_rules(&policy, args.get_flag("json"))?);
            if args.get_flag("json") {
                println!();
            }
        }
        Some(("watch", args)) => {
            let policy = load_policy(path(args, "policy").map(PathBuf::as_path))?;
            let engine = build_engine(policy, None);
            let input = path(args, "input").context("--input is required")?;
            let interval = *args.get_one::<u64>("interval-secs").unwrap_or(&60);

            run_watch(&engine, input, Duration::from_secs(interval)).await?;
        }
        _ => unreachable!("subcommand_required is set"),
    }

    Ok(())
}
