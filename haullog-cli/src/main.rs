mod atlas;
mod reports;
mod scenarios;
mod util;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use env_logger::{Builder, Env};
use haullog_engine::{HosRules, TripPlanner};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use atlas::{FixtureAtlas, TripFixture};
use scenarios::{expand_scenarios, list_scenarios, run_scenarios};
use util::{OutputTarget, split_csv};

#[derive(Debug, Parser)]
#[command(name = "haullog", version = "0.1.0")]
#[command(about = "Hours-of-Service duty schedule planner for three-stop truck trips")]
struct Args {
    /// Trip fixture with waypoints, places and routes (JSON)
    #[arg(long)]
    trip: Option<PathBuf>,

    /// Override the fixture's current location
    #[arg(long)]
    current: Option<String>,

    /// Override the fixture's pickup location
    #[arg(long)]
    pickup: Option<String>,

    /// Override the fixture's dropoff location
    #[arg(long)]
    dropoff: Option<String>,

    /// Override the cycle hours already used
    #[arg(long)]
    cycle: Option<f64>,

    /// Built-in scenarios to run (comma-separated, or "all")
    #[arg(long)]
    scenarios: Option<String>,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json", "markdown"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Hours-of-Service rules override (JSON, missing fields use FMCSA values)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let mut output = OutputTarget::new(args.output.clone())?;
    if !output.is_stdout() {
        colored::control::set_override(false);
    }

    if args.list_scenarios {
        writeln!(output, "Available scenarios:")?;
        for (key, description) in list_scenarios() {
            writeln!(output, "  {key:16} - {description}")?;
        }
        output.flush()?;
        return Ok(());
    }

    let rules = load_rules(args.rules.as_deref())?;
    let passed = if let Some(names) = &args.scenarios {
        run_scenario_mode(&args, &mut output, &rules, names)?
    } else if let Some(path) = &args.trip {
        run_trip_mode(&args, &mut output, &rules, path)?
    } else {
        bail!("nothing to do: pass --trip <file>, --scenarios <names> or --list-scenarios");
    };
    output.flush()?;

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}

fn load_rules(path: Option<&Path>) -> Result<HosRules> {
    let Some(path) = path else {
        return Ok(HosRules::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules {}", path.display()))?;
    let rules = HosRules::from_json(&raw)
        .with_context(|| format!("invalid rules in {}", path.display()))?;
    info!("loaded rules from {}", path.display());
    Ok(rules)
}

fn run_scenario_mode(
    args: &Args,
    output: &mut OutputTarget,
    rules: &HosRules,
    names: &str,
) -> Result<bool> {
    let names = expand_scenarios(split_csv(names));
    if args.report == "console" {
        writeln!(output, "{}", "🚚 Haullog Scenario Runner".bright_cyan().bold())?;
        writeln!(output, "{}", "==========================".cyan())?;
    }

    let start_time = Instant::now();
    let (results, unknown) = run_scenarios(&names, rules);
    for name in &unknown {
        eprintln!("⚠️  Unknown scenario: {}", name.yellow());
    }

    match args.report.as_str() {
        "json" => reports::generate_json_report(output, &results)?,
        "markdown" => reports::generate_markdown_report(output, &results)?,
        _ => reports::generate_console_report(output, &results, start_time.elapsed())?,
    }

    Ok(unknown.is_empty() && results.iter().all(|result| result.passed))
}

fn run_trip_mode(
    args: &Args,
    output: &mut OutputTarget,
    rules: &HosRules,
    path: &Path,
) -> Result<bool> {
    let fixture = TripFixture::load(path)?;
    let atlas = FixtureAtlas::from_fixture(&fixture)
        .with_context(|| format!("invalid trip fixture {}", path.display()))?;
    info!(
        "fixture {}: {} place(s), {} route(s)",
        path.display(),
        atlas.place_count(),
        atlas.route_count()
    );

    let mut request = fixture.request();
    if let Some(current) = &args.current {
        request.current.clone_from(current);
    }
    if let Some(pickup) = &args.pickup {
        request.pickup.clone_from(pickup);
    }
    if let Some(dropoff) = &args.dropoff {
        request.dropoff.clone_from(dropoff);
    }
    if let Some(cycle) = args.cycle {
        request.cycle_hours_used = cycle;
    }

    let planner = TripPlanner::new(&atlas, &atlas).with_rules(*rules);
    let outcome = planner.plan_traced(&request);
    match args.report.as_str() {
        "json" => reports::trip_json_report(output, outcome.as_ref())?,
        "markdown" => reports::trip_markdown_report(output, outcome.as_ref())?,
        _ => reports::trip_console_report(output, outcome.as_ref(), args.verbose)?,
    }
    Ok(outcome.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_trip_overrides() {
        let args = Args::try_parse_from([
            "haullog",
            "--trip",
            "trip.json",
            "--pickup",
            "Tulsa, OK",
            "--cycle",
            "12.5",
            "--report",
            "json",
        ])
        .expect("parse");
        assert_eq!(args.trip, Some(PathBuf::from("trip.json")));
        assert_eq!(args.pickup.as_deref(), Some("Tulsa, OK"));
        assert_eq!(args.cycle, Some(12.5));
        assert_eq!(args.report, "json");
    }

    #[test]
    fn args_reject_unknown_report_format() {
        assert!(Args::try_parse_from(["haullog", "--report", "csv"]).is_err());
    }

    #[test]
    fn missing_rules_path_uses_defaults() {
        let rules = load_rules(None).expect("defaults");
        assert_eq!(rules, HosRules::default());
    }
}
