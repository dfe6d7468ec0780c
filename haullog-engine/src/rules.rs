//! Hours-of-Service rule configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

/// Priority order used by the post-drive need check.
///
/// When the driver cannot move at all, the leg driver always resolves needs in
/// the order cycle, drive/window, break, fuel. After a partial drive segment the
/// legacy order checks fuel first instead; `Unified` reuses the blocked order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOrdering {
    #[default]
    Legacy,
    Unified,
}

/// Errors raised when rule configuration invariants are violated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RulesError {
    #[error("{field} must be positive (got {value:.3})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value:.3})")]
    Negative { field: &'static str, value: f64 },
    #[error("exhaustion epsilon {epsilon:.3}h must be below the smallest limit {smallest:.3}h")]
    EpsilonTooLarge { epsilon: f64, smallest: f64 },
    #[error("invalid rules document: {0}")]
    Parse(String),
}

/// Regulatory limits and operational assumptions read by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HosRules {
    #[serde(default = "HosRules::default_max_drive_hours")]
    pub max_drive_hours: f64,
    #[serde(default = "HosRules::default_max_duty_window_hours")]
    pub max_duty_window_hours: f64,
    #[serde(default = "HosRules::default_break_required_after_hours")]
    pub break_required_after_hours: f64,
    /// Shortest off-duty (or on-duty) stretch that clears the break clock.
    #[serde(default = "HosRules::default_min_break_hours")]
    pub min_break_hours: f64,
    /// Shortest rest that zeroes the drive and window clocks.
    #[serde(default = "HosRules::default_sleeper_rest_hours")]
    pub sleeper_rest_hours: f64,
    /// Shortest rest that zeroes the cycle.
    #[serde(default = "HosRules::default_restart_hours")]
    pub restart_hours: f64,
    #[serde(default = "HosRules::default_max_cycle_hours")]
    pub max_cycle_hours: f64,
    #[serde(default = "HosRules::default_fuel_interval_miles")]
    pub fuel_interval_miles: f64,
    #[serde(default = "HosRules::default_fuel_stop_hours")]
    pub fuel_stop_hours: f64,
    #[serde(default = "HosRules::default_load_unload_hours")]
    pub load_unload_hours: f64,
    #[serde(default = "HosRules::default_pre_trip_hours")]
    pub pre_trip_hours: f64,
    #[serde(default = "HosRules::default_avg_speed_mph")]
    pub avg_speed_mph: f64,
    /// Clock reading (hours after midnight of day 0) when the trip starts.
    #[serde(default = "HosRules::default_day_start_hour")]
    pub day_start_hour: f64,
    #[serde(default = "HosRules::default_exhaustion_epsilon_hours")]
    pub exhaustion_epsilon_hours: f64,
    #[serde(default = "HosRules::default_arrival_tolerance_miles")]
    pub arrival_tolerance_miles: f64,
    #[serde(default)]
    pub stop_ordering: StopOrdering,
}

impl HosRules {
    const fn default_max_drive_hours() -> f64 {
        constants::MAX_DRIVE_HOURS
    }

    const fn default_max_duty_window_hours() -> f64 {
        constants::MAX_DUTY_WINDOW_HOURS
    }

    const fn default_break_required_after_hours() -> f64 {
        constants::BREAK_REQUIRED_AFTER_HOURS
    }

    const fn default_min_break_hours() -> f64 {
        constants::MIN_BREAK_HOURS
    }

    const fn default_sleeper_rest_hours() -> f64 {
        constants::SLEEPER_REST_HOURS
    }

    const fn default_restart_hours() -> f64 {
        constants::RESTART_HOURS
    }

    const fn default_max_cycle_hours() -> f64 {
        constants::MAX_CYCLE_HOURS
    }

    const fn default_fuel_interval_miles() -> f64 {
        constants::FUEL_INTERVAL_MILES
    }

    const fn default_fuel_stop_hours() -> f64 {
        constants::FUEL_STOP_HOURS
    }

    const fn default_load_unload_hours() -> f64 {
        constants::LOAD_UNLOAD_HOURS
    }

    const fn default_pre_trip_hours() -> f64 {
        constants::PRE_TRIP_HOURS
    }

    const fn default_avg_speed_mph() -> f64 {
        constants::AVG_SPEED_MPH
    }

    const fn default_day_start_hour() -> f64 {
        constants::DAY_START_HOUR
    }

    const fn default_exhaustion_epsilon_hours() -> f64 {
        constants::EXHAUSTION_EPSILON_HOURS
    }

    const fn default_arrival_tolerance_miles() -> f64 {
        constants::ARRIVAL_TOLERANCE_MILES
    }

    /// FMCSA property-carrying defaults.
    #[must_use]
    pub const fn fmcsa() -> Self {
        Self {
            max_drive_hours: Self::default_max_drive_hours(),
            max_duty_window_hours: Self::default_max_duty_window_hours(),
            break_required_after_hours: Self::default_break_required_after_hours(),
            min_break_hours: Self::default_min_break_hours(),
            sleeper_rest_hours: Self::default_sleeper_rest_hours(),
            restart_hours: Self::default_restart_hours(),
            max_cycle_hours: Self::default_max_cycle_hours(),
            fuel_interval_miles: Self::default_fuel_interval_miles(),
            fuel_stop_hours: Self::default_fuel_stop_hours(),
            load_unload_hours: Self::default_load_unload_hours(),
            pre_trip_hours: Self::default_pre_trip_hours(),
            avg_speed_mph: Self::default_avg_speed_mph(),
            day_start_hour: Self::default_day_start_hour(),
            exhaustion_epsilon_hours: Self::default_exhaustion_epsilon_hours(),
            arrival_tolerance_miles: Self::default_arrival_tolerance_miles(),
            stop_ordering: StopOrdering::Legacy,
        }
    }

    #[must_use]
    pub const fn with_stop_ordering(mut self, ordering: StopOrdering) -> Self {
        self.stop_ordering = ordering;
        self
    }

    /// Parse a JSON rules document, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Parse`] for malformed JSON and the matching
    /// violation when a parsed value is out of range.
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let rules: Self =
            serde_json::from_str(json).map_err(|err| RulesError::Parse(err.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check that every limit is usable by the leg driver.
    ///
    /// Limits, rest durations and speed must be positive so that every
    /// inserted rest resets the counter that forced it; the remaining fields
    /// only need to be non-negative.
    ///
    /// # Errors
    ///
    /// Returns the first violated field.
    pub fn validate(&self) -> Result<(), RulesError> {
        let positive = [
            ("max_drive_hours", self.max_drive_hours),
            ("max_duty_window_hours", self.max_duty_window_hours),
            ("break_required_after_hours", self.break_required_after_hours),
            ("min_break_hours", self.min_break_hours),
            ("sleeper_rest_hours", self.sleeper_rest_hours),
            ("restart_hours", self.restart_hours),
            ("max_cycle_hours", self.max_cycle_hours),
            ("fuel_interval_miles", self.fuel_interval_miles),
            ("avg_speed_mph", self.avg_speed_mph),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(RulesError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("fuel_stop_hours", self.fuel_stop_hours),
            ("load_unload_hours", self.load_unload_hours),
            ("pre_trip_hours", self.pre_trip_hours),
            ("day_start_hour", self.day_start_hour),
            ("exhaustion_epsilon_hours", self.exhaustion_epsilon_hours),
            ("arrival_tolerance_miles", self.arrival_tolerance_miles),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RulesError::Negative { field, value });
            }
        }

        let smallest = [
            self.max_drive_hours,
            self.max_duty_window_hours,
            self.break_required_after_hours,
            self.max_cycle_hours,
            self.fuel_interval_miles / self.avg_speed_mph,
        ]
        .into_iter()
        .fold(f64::INFINITY, f64::min);
        if self.exhaustion_epsilon_hours >= smallest {
            return Err(RulesError::EpsilonTooLarge {
                epsilon: self.exhaustion_epsilon_hours,
                smallest,
            });
        }
        Ok(())
    }
}

impl Default for HosRules {
    fn default() -> Self {
        Self::fmcsa()
    }
}
