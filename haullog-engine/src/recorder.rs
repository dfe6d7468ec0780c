//! Duty log and stop recording.
//!
//! [`DutyRecorder`] is the only writer of a trip's [`ClockState`]: every logged
//! interval advances the clock and applies the counter rules for its status in
//! one place, so logs and counters cannot drift apart.
use serde::{Deserialize, Serialize};

use crate::clock::{ClockState, DutyStatus};
use crate::constants::LOG_TIME_DECIMALS;
use crate::geometry::Coordinate;
use crate::numbers::{round_to, sanitize_non_negative};
use crate::rules::HosRules;

/// Kind of notable stop shown on the trip map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    Start,
    Inspection,
    Pickup,
    Fuel,
    Break,
    Sleep,
    Restart,
    Dropoff,
    End,
}

impl StopKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Inspection => "inspection",
            Self::Pickup => "pickup",
            Self::Fuel => "fuel",
            Self::Break => "break",
            Self::Sleep => "sleep",
            Self::Restart => "restart",
            Self::Dropoff => "dropoff",
            Self::End => "end",
        }
    }
}

/// One contiguous duty-status interval, in hours since midnight of day 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub status: DutyStatus,
    pub start: f64,
    pub end: f64,
    pub location: Coordinate,
    pub remarks: String,
}

impl LogEntry {
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub coords: Coordinate,
    #[serde(rename = "type")]
    pub kind: StopKind,
    pub remark: String,
    pub time: f64,
    pub duration: f64,
}

/// Clock snapshot taken immediately before a logged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTrace {
    pub status: DutyStatus,
    pub stop: Option<StopKind>,
    pub clock_before: ClockState,
}

/// Appends duty intervals and stops while keeping the trip clock consistent.
#[derive(Debug, Clone)]
pub struct DutyRecorder {
    rules: HosRules,
    clock: ClockState,
    logs: Vec<LogEntry>,
    stops: Vec<Stop>,
    trace: Option<Vec<EventTrace>>,
}

impl DutyRecorder {
    /// Start a trip clock at the configured day start with `cycle_used` hours spent.
    #[must_use]
    pub fn new(rules: HosRules, cycle_used: f64) -> Self {
        Self {
            clock: ClockState::new(rules.day_start_hour, sanitize_non_negative(cycle_used)),
            rules,
            logs: Vec::new(),
            stops: Vec::new(),
            trace: None,
        }
    }

    /// Capture a [`EventTrace`] before every subsequent event.
    #[must_use]
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    #[must_use]
    pub const fn rules(&self) -> &HosRules {
        &self.rules
    }

    #[must_use]
    pub const fn clock(&self) -> &ClockState {
        &self.clock
    }

    #[must_use]
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    #[must_use]
    pub fn trace(&self) -> &[EventTrace] {
        self.trace.as_deref().unwrap_or_default()
    }

    /// Log `duration` hours of `status` at `location`, optionally marking a stop.
    ///
    /// Negative or non-finite durations are recorded as zero-length intervals.
    pub fn add_event(
        &mut self,
        status: DutyStatus,
        duration: f64,
        location: Coordinate,
        remark: &str,
        stop: Option<StopKind>,
    ) {
        let duration = sanitize_non_negative(duration);
        if let Some(trace) = self.trace.as_mut() {
            trace.push(EventTrace {
                status,
                stop,
                clock_before: self.clock.clone(),
            });
        }

        let start = self.clock.current_time();
        self.logs.push(LogEntry {
            status,
            start: round_to(start, LOG_TIME_DECIMALS),
            end: round_to(start + duration, LOG_TIME_DECIMALS),
            location,
            remarks: remark.to_string(),
        });

        if let Some(kind) = stop {
            self.stops.push(Stop {
                coords: location,
                kind,
                remark: remark.to_string(),
                time: round_to(start, LOG_TIME_DECIMALS),
                duration: round_to(duration, LOG_TIME_DECIMALS),
            });
        }

        self.clock.apply(status, duration, &self.rules);
    }

    /// Append a zero-duration stop marker without logging a duty interval.
    ///
    /// Markers carry the clock unrounded, unlike logged events.
    pub fn add_marker(&mut self, kind: StopKind, coords: Coordinate, remark: &str) {
        self.stops.push(Stop {
            coords,
            kind,
            remark: remark.to_string(),
            time: self.clock.current_time(),
            duration: 0.0,
        });
    }

    /// Count miles driven toward the next fuel stop.
    pub fn record_distance(&mut self, miles: f64) {
        self.clock.add_miles(sanitize_non_negative(miles));
    }

    pub fn record_refuel(&mut self) {
        self.clock.refuel();
    }

    /// Consume the recorder, returning the final clock, logs and stops.
    #[must_use]
    pub fn finish(self) -> (ClockState, Vec<LogEntry>, Vec<Stop>, Vec<EventTrace>) {
        (
            self.clock,
            self.logs,
            self.stops,
            self.trace.unwrap_or_default(),
        )
    }
}
