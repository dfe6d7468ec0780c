//! Trip totals derived from a finished duty log.
use serde::{Deserialize, Serialize};

use crate::clock::DutyStatus;
use crate::constants::{HOURS_PER_DAY, SUMMARY_DECIMALS};
use crate::numbers::{floor_f64_to_u32, round_to};
use crate::recorder::{LogEntry, Stop};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub total_miles: f64,
    pub leg1_miles: f64,
    pub leg2_miles: f64,
    pub total_drive_time: f64,
    pub total_rest_time: f64,
    pub total_on_duty_time: f64,
    pub total_trip_time: f64,
    pub num_stops: usize,
    pub num_days: u32,
}

/// Aggregate the log into rounded totals.
///
/// `final_time` is the trip clock after the last event and `day_start` the
/// clock reading the trip began at; both are hours since midnight of day 0.
#[must_use]
pub fn build_summary(
    logs: &[LogEntry],
    stops: &[Stop],
    leg_miles: (f64, f64),
    final_time: f64,
    day_start: f64,
) -> TripSummary {
    let hours_where = |keep: fn(DutyStatus) -> bool| -> f64 {
        logs.iter()
            .filter(|entry| keep(entry.status))
            .map(LogEntry::duration)
            .sum()
    };
    let drive = hours_where(|status| status == DutyStatus::Driving);
    let rest = hours_where(DutyStatus::is_rest);
    let on_duty = hours_where(|status| status == DutyStatus::OnDuty);
    let (leg1, leg2) = leg_miles;

    TripSummary {
        total_miles: round_to(leg1 + leg2, SUMMARY_DECIMALS),
        leg1_miles: round_to(leg1, SUMMARY_DECIMALS),
        leg2_miles: round_to(leg2, SUMMARY_DECIMALS),
        total_drive_time: round_to(drive, SUMMARY_DECIMALS),
        total_rest_time: round_to(rest, SUMMARY_DECIMALS),
        total_on_duty_time: round_to(on_duty, SUMMARY_DECIMALS),
        total_trip_time: round_to(final_time - day_start, SUMMARY_DECIMALS),
        num_stops: stops.len(),
        num_days: (floor_f64_to_u32(final_time / HOURS_PER_DAY) + 1).max(1),
    }
}
