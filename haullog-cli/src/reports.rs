use anyhow::Result;
use colored::Colorize;
use haullog_engine::{DutyStatus, ScheduleResponse, SimulatedTrip, TripError};
use std::io::Write;
use std::time::Duration;

use crate::scenarios::ScenarioResult;
use crate::util::format_clock;

fn status_label(status: DutyStatus) -> colored::ColoredString {
    let label = format!("{:8}", status.as_str());
    match status {
        DutyStatus::Driving => label.green(),
        DutyStatus::OnDuty => label.yellow(),
        DutyStatus::OffDuty => label.blue(),
        DutyStatus::Sleeper => label.magenta(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (passed as f64 / total as f64) * 100.0
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Scenario Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Total scenarios: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(passed, total))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{status} {}", result.scenario_name.bold())?;
        writeln!(
            out,
            "   Checks: {} run, {} failed ({:.2} ms)",
            result.checks_run,
            result.failures.len(),
            result.elapsed_ms
        )?;
        if let Some(summary) = &result.summary {
            writeln!(
                out,
                "   {:.1} mi, {:.1}h driving, {} stop(s) over {} day(s)",
                summary.total_miles, summary.total_drive_time, summary.num_stops, summary.num_days
            )?;
        }
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Haullog Scenario Results\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(passed, total))?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {status} {}\n", result.scenario_name)?;
        writeln!(out, "- **Checks run**: {}", result.checks_run)?;
        if let Some(digest) = &result.digest {
            writeln!(out, "- **Digest**: `{digest}`")?;
        }
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn trip_json_report(
    out: &mut dyn Write,
    outcome: Result<&SimulatedTrip, &TripError>,
) -> Result<()> {
    let response = ScheduleResponse::from(
        outcome
            .map(|trip| trip.result.clone())
            .map_err(TripError::clone),
    );
    writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
    Ok(())
}

pub fn trip_console_report(
    out: &mut dyn Write,
    outcome: Result<&SimulatedTrip, &TripError>,
    verbose: bool,
) -> Result<()> {
    let trip = match outcome {
        Ok(trip) => trip,
        Err(err) => {
            writeln!(out, "{} {}", "❌".red(), err.to_string().red())?;
            return Ok(());
        }
    };
    let result = &trip.result;
    let summary = &result.summary;

    writeln!(out, "{}", "🚚 Duty Schedule".bright_cyan().bold())?;
    writeln!(out, "{}", "================".cyan())?;
    for entry in &result.logs {
        writeln!(
            out,
            "{} → {}  {}  {:6.2}h  {}  @ {}",
            format_clock(entry.start),
            format_clock(entry.end),
            status_label(entry.status),
            entry.duration(),
            entry.remarks,
            entry.location
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "📍 Stops".bright_yellow().bold())?;
    for stop in &result.stops {
        writeln!(
            out,
            "  {} {:10} {:32} {:5.2}h  @ {}",
            format_clock(stop.time),
            stop.kind.as_str(),
            stop.remark,
            stop.duration,
            stop.coords
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "📊 Summary".bright_yellow().bold())?;
    writeln!(
        out,
        "  Miles: {:.1} total ({:.1} to pickup, {:.1} to dropoff)",
        summary.total_miles, summary.leg1_miles, summary.leg2_miles
    )?;
    writeln!(
        out,
        "  Hours: {:.1} driving, {:.1} on duty, {:.1} resting, {:.1} elapsed",
        summary.total_drive_time,
        summary.total_on_duty_time,
        summary.total_rest_time,
        summary.total_trip_time
    )?;
    writeln!(
        out,
        "  Stops: {}  Days: {}",
        summary.num_stops, summary.num_days
    )?;

    if verbose {
        writeln!(out)?;
        for report in &trip.legs {
            let rests: Vec<&str> = report.rests.iter().map(|kind| kind.as_str()).collect();
            writeln!(
                out,
                "  {}: {:.1} mi in {:.2}h, rests [{}]",
                report.leg,
                report.miles_driven,
                report.drive_hours,
                rests.join(", ")
            )?;
        }
        writeln!(out, "  Digest: {:016x}", result.digest())?;
    }
    Ok(())
}

pub fn trip_markdown_report(
    out: &mut dyn Write,
    outcome: Result<&SimulatedTrip, &TripError>,
) -> Result<()> {
    writeln!(out, "# Haullog Trip Schedule\n")?;
    let trip = match outcome {
        Ok(trip) => trip,
        Err(err) => {
            writeln!(out, "**Error**: {err}")?;
            return Ok(());
        }
    };
    let result = &trip.result;
    let summary = &result.summary;

    writeln!(out, "## Duty Log\n")?;
    writeln!(out, "| Start | End | Status | Hours | Remarks |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for entry in &result.logs {
        writeln!(
            out,
            "| {} | {} | {} | {:.2} | {} |",
            format_clock(entry.start),
            format_clock(entry.end),
            entry.status,
            entry.duration(),
            entry.remarks
        )?;
    }

    writeln!(out, "\n## Stops\n")?;
    for stop in &result.stops {
        writeln!(
            out,
            "- **{}** `{}` {} ({:.2}h)",
            format_clock(stop.time),
            stop.kind.as_str(),
            stop.remark,
            stop.duration
        )?;
    }

    writeln!(out, "\n## Summary\n")?;
    writeln!(out, "- **Total miles**: {:.1}", summary.total_miles)?;
    writeln!(out, "- **Driving hours**: {:.1}", summary.total_drive_time)?;
    writeln!(out, "- **On-duty hours**: {:.1}", summary.total_on_duty_time)?;
    writeln!(out, "- **Rest hours**: {:.1}", summary.total_rest_time)?;
    writeln!(out, "- **Trip hours**: {:.1}", summary.total_trip_time)?;
    writeln!(out, "- **Stops**: {}", summary.num_stops)?;
    writeln!(out, "- **Days**: {}", summary.num_days)?;
    Ok(())
}
