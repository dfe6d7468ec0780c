//! Elapsed time and regulatory counters for a single trip.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rules::HosRules;

/// Duty status tag carried by every logged interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DutyStatus {
    Driving,
    OnDuty,
    OffDuty,
    Sleeper,
}

impl DutyStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Driving => "DRIVING",
            Self::OnDuty => "ON_DUTY",
            Self::OffDuty => "OFF_DUTY",
            Self::Sleeper => "SLEEPER",
        }
    }

    /// Off-duty and sleeper time both count as rest.
    #[must_use]
    pub const fn is_rest(self) -> bool {
        matches!(self, Self::OffDuty | Self::Sleeper)
    }
}

impl fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable clock record for one trip.
///
/// Times are hours, `miles_since_fuel` is miles. Fields are read-only outside
/// the crate; every mutation goes through [`crate::recorder::DutyRecorder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    current_time: f64,
    cycle_used: f64,
    drive_clock: f64,
    window_clock: f64,
    since_break_clock: f64,
    miles_since_fuel: f64,
}

impl ClockState {
    /// Fresh trip clock at `start_time` carrying `cycle_used` hours from prior days.
    #[must_use]
    pub const fn new(start_time: f64, cycle_used: f64) -> Self {
        Self {
            current_time: start_time,
            cycle_used,
            drive_clock: 0.0,
            window_clock: 0.0,
            since_break_clock: 0.0,
            miles_since_fuel: 0.0,
        }
    }

    #[must_use]
    pub const fn current_time(&self) -> f64 {
        self.current_time
    }

    #[must_use]
    pub const fn cycle_used(&self) -> f64 {
        self.cycle_used
    }

    #[must_use]
    pub const fn drive_clock(&self) -> f64 {
        self.drive_clock
    }

    #[must_use]
    pub const fn window_clock(&self) -> f64 {
        self.window_clock
    }

    #[must_use]
    pub const fn since_break_clock(&self) -> f64 {
        self.since_break_clock
    }

    #[must_use]
    pub const fn miles_since_fuel(&self) -> f64 {
        self.miles_since_fuel
    }

    /// Hours of driving left before the daily drive limit.
    #[must_use]
    pub fn drive_headroom(&self, rules: &HosRules) -> f64 {
        (rules.max_drive_hours - self.drive_clock).max(0.0)
    }

    /// Hours left in the on-duty window.
    #[must_use]
    pub fn window_headroom(&self, rules: &HosRules) -> f64 {
        (rules.max_duty_window_hours - self.window_clock).max(0.0)
    }

    /// Hours of driving left before a break is required.
    #[must_use]
    pub fn break_headroom(&self, rules: &HosRules) -> f64 {
        (rules.break_required_after_hours - self.since_break_clock).max(0.0)
    }

    /// Hours left in the multi-day cycle.
    #[must_use]
    pub fn cycle_headroom(&self, rules: &HosRules) -> f64 {
        (rules.max_cycle_hours - self.cycle_used).max(0.0)
    }

    /// Hours of driving at average speed before the next fuel stop is due.
    #[must_use]
    pub fn fuel_headroom(&self, rules: &HosRules) -> f64 {
        ((rules.fuel_interval_miles - self.miles_since_fuel) / rules.avg_speed_mph).max(0.0)
    }

    /// Advance the clock by `duration` hours of `status` and update counters.
    pub(crate) fn apply(&mut self, status: DutyStatus, duration: f64, rules: &HosRules) {
        self.current_time += duration;

        match status {
            DutyStatus::Driving => {
                self.drive_clock += duration;
                self.since_break_clock += duration;
                self.cycle_used += duration;
                self.window_clock += duration;
            }
            DutyStatus::OnDuty => {
                self.cycle_used += duration;
                self.window_clock += duration;
                if duration >= rules.min_break_hours {
                    self.since_break_clock = 0.0;
                }
            }
            DutyStatus::OffDuty | DutyStatus::Sleeper => {
                self.window_clock += duration;
                if duration >= rules.min_break_hours {
                    self.since_break_clock = 0.0;
                }
                if duration >= rules.sleeper_rest_hours {
                    self.drive_clock = 0.0;
                    self.window_clock = 0.0;
                }
                if duration >= rules.restart_hours {
                    self.cycle_used = 0.0;
                }
            }
        }
    }

    pub(crate) fn add_miles(&mut self, miles: f64) {
        self.miles_since_fuel += miles;
    }

    pub(crate) const fn refuel(&mut self) {
        self.miles_since_fuel = 0.0;
    }
}
