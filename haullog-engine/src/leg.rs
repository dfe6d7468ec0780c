//! Per-leg driving loop.
//!
//! Each iteration measures six headrooms (finish, drive limit, duty window,
//! break requirement, cycle, fuel), drives until the tightest one runs out and
//! inserts whichever regulatory stop is due. Distance is only consumed by
//! DRIVING events; every inserted stop resets the counter that forced it.
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::{ClockState, DutyStatus};
use crate::constants::{
    REMARK_BREAK, REMARK_EN_ROUTE_PREFIX, REMARK_FUEL, REMARK_RESTART, REMARK_SLEEPER,
};
use crate::geometry::{Coordinate, interpolate_along};
use crate::numbers::sanitize_non_negative;
use crate::recorder::{DutyRecorder, StopKind};
use crate::rules::{HosRules, StopOrdering};

/// Route leg as delivered by a [`crate::RouteProvider`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_miles: f64,
    #[serde(default)]
    pub geometry: Vec<Coordinate>,
}

impl RouteLeg {
    #[must_use]
    pub const fn new(distance_miles: f64, geometry: Vec<Coordinate>) -> Self {
        Self {
            distance_miles,
            geometry,
        }
    }

    /// Build a leg from a routing service distance in metres.
    #[must_use]
    pub fn from_meters(distance_meters: f64, geometry: Vec<Coordinate>) -> Self {
        Self::new(distance_meters * crate::constants::MILES_PER_METER, geometry)
    }
}

/// Which of the two trip legs is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegId {
    ToPickup,
    ToDropoff,
}

impl LegId {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ToPickup => "to Pickup",
            Self::ToDropoff => "to Dropoff",
        }
    }

    /// Human-readable origin and destination of the leg.
    #[must_use]
    pub const fn endpoints(self) -> (&'static str, &'static str) {
        match self {
            Self::ToPickup => ("Current Location", "Pickup"),
            Self::ToDropoff => ("Pickup", "Dropoff"),
        }
    }
}

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Regulatory stop the driver must take before driving further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestNeed {
    /// Cycle exhausted: 34-hour restart.
    Restart,
    /// Drive limit or duty window exhausted: sleeper berth rest.
    Sleeper,
    /// Break requirement exhausted: 30-minute break.
    Break,
    /// Fuel interval exhausted.
    Fuel,
}

impl RestNeed {
    const BLOCKED_ORDER: [Self; 4] = [Self::Restart, Self::Sleeper, Self::Break, Self::Fuel];
    const LEGACY_POST_DRIVE_ORDER: [Self; 4] =
        [Self::Fuel, Self::Restart, Self::Sleeper, Self::Break];

    #[must_use]
    pub const fn stop_kind(self) -> StopKind {
        match self {
            Self::Restart => StopKind::Restart,
            Self::Sleeper => StopKind::Sleep,
            Self::Break => StopKind::Break,
            Self::Fuel => StopKind::Fuel,
        }
    }

    fn status_and_duration(self, rules: &HosRules) -> (DutyStatus, f64, &'static str) {
        match self {
            Self::Restart => (DutyStatus::OffDuty, rules.restart_hours, REMARK_RESTART),
            Self::Sleeper => (DutyStatus::Sleeper, rules.sleeper_rest_hours, REMARK_SLEEPER),
            Self::Break => (DutyStatus::OffDuty, rules.min_break_hours, REMARK_BREAK),
            Self::Fuel => (DutyStatus::OnDuty, rules.fuel_stop_hours, REMARK_FUEL),
        }
    }
}

/// Time (hours) the driver may still drive under each constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Headroom {
    pub finish: f64,
    pub drive: f64,
    pub window: f64,
    pub rest_break: f64,
    pub cycle: f64,
    pub fuel: f64,
}

impl Headroom {
    #[must_use]
    pub fn measure(clock: &ClockState, rules: &HosRules, remaining_miles: f64) -> Self {
        Self {
            finish: (remaining_miles / rules.avg_speed_mph).max(0.0),
            drive: clock.drive_headroom(rules),
            window: clock.window_headroom(rules),
            rest_break: clock.break_headroom(rules),
            cycle: clock.cycle_headroom(rules),
            fuel: clock.fuel_headroom(rules),
        }
    }

    /// Tightest of the six constraints.
    #[must_use]
    pub fn limiting(&self) -> f64 {
        [
            self.finish,
            self.drive,
            self.window,
            self.rest_break,
            self.cycle,
            self.fuel,
        ]
        .into_iter()
        .fold(f64::INFINITY, f64::min)
    }

    fn is_exhausted(&self, need: RestNeed, epsilon: f64) -> bool {
        match need {
            RestNeed::Restart => self.cycle <= epsilon,
            RestNeed::Sleeper => self.drive <= epsilon || self.window <= epsilon,
            RestNeed::Break => self.rest_break <= epsilon,
            RestNeed::Fuel => self.fuel <= epsilon,
        }
    }

    /// First exhausted need in `order`.
    #[must_use]
    pub fn first_need(&self, order: &[RestNeed], epsilon: f64) -> Option<RestNeed> {
        order
            .iter()
            .copied()
            .find(|&need| self.is_exhausted(need, epsilon))
    }
}

/// Outcome of driving one leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegReport {
    pub leg: LegId,
    pub miles_driven: f64,
    pub drive_hours: f64,
    /// Regulatory stops inserted while on this leg, in order.
    pub rests: Vec<StopKind>,
}

const fn post_drive_order(ordering: StopOrdering) -> &'static [RestNeed; 4] {
    match ordering {
        StopOrdering::Legacy => &RestNeed::LEGACY_POST_DRIVE_ORDER,
        StopOrdering::Unified => &RestNeed::BLOCKED_ORDER,
    }
}

fn position_on_leg(geometry: &[Coordinate], fraction: f64, fallback: Coordinate) -> Coordinate {
    interpolate_along(geometry, fraction).unwrap_or_else(|| {
        warn!("leg geometry is empty; placing event at {fallback}");
        fallback
    })
}

fn insert_rest(
    recorder: &mut DutyRecorder,
    need: RestNeed,
    at: Coordinate,
    report: &mut LegReport,
) {
    let (status, duration, remark) = need.status_and_duration(recorder.rules());
    debug!(
        "{}: {remark} at t={:.3}h ({status} {duration}h)",
        report.leg,
        recorder.clock().current_time()
    );
    recorder.add_event(status, duration, at, remark, Some(need.stop_kind()));
    if need == RestNeed::Fuel {
        recorder.record_refuel();
    }
    report.rests.push(need.stop_kind());
}

/// Drive `route` to completion, logging driving segments and required stops.
///
/// `origin` is where the leg starts and stands in for positions when the
/// route geometry is empty. A negative or non-finite distance is driven as a
/// zero-mile leg, and rules that fail [`HosRules::validate`] drive nothing.
pub fn drive_leg(
    recorder: &mut DutyRecorder,
    leg: LegId,
    origin: Coordinate,
    route: &RouteLeg,
) -> LegReport {
    let rules = *recorder.rules();
    let remark = format!("{REMARK_EN_ROUTE_PREFIX} ({})", leg.label());
    let mut report = LegReport {
        leg,
        miles_driven: 0.0,
        drive_hours: 0.0,
        rests: Vec::new(),
    };
    if let Err(err) = rules.validate() {
        warn!("{leg}: refusing to drive under invalid rules: {err}");
        return report;
    }
    if !(route.distance_miles.is_finite() && route.distance_miles >= 0.0) {
        warn!("{leg}: unusable distance {}; treating as 0 mi", route.distance_miles);
    }
    let total_miles = sanitize_non_negative(route.distance_miles);
    let mut remaining = total_miles;
    let mut driven_on_leg = 0.0;

    while remaining > rules.arrival_tolerance_miles {
        let fraction = if total_miles > 0.0 {
            driven_on_leg / total_miles
        } else {
            0.0
        };
        let position = position_on_leg(&route.geometry, fraction, origin);

        let headroom = Headroom::measure(recorder.clock(), &rules, remaining);
        let limiting = headroom.limiting();

        if limiting <= rules.exhaustion_epsilon_hours {
            match headroom.first_need(&RestNeed::BLOCKED_ORDER, rules.exhaustion_epsilon_hours) {
                Some(need) => insert_rest(recorder, need, position, &mut report),
                None => {
                    warn!(
                        "{leg}: no drivable time and no stop applies with {remaining:.2} mi left; ending leg"
                    );
                    break;
                }
            }
            continue;
        }

        let finishes_leg = limiting >= headroom.finish;
        let (hours, miles) = if finishes_leg {
            (headroom.finish, remaining)
        } else {
            (limiting, limiting * rules.avg_speed_mph)
        };
        trace!(
            "{leg}: driving {hours:.3}h / {miles:.1} mi from t={:.3}h",
            recorder.clock().current_time()
        );
        recorder.add_event(DutyStatus::Driving, hours, position, &remark, None);
        remaining = if finishes_leg { 0.0 } else { remaining - miles };
        driven_on_leg += miles;
        recorder.record_distance(miles);
        report.miles_driven += miles;
        report.drive_hours += hours;

        if remaining > rules.arrival_tolerance_miles {
            let fraction = if total_miles > 0.0 {
                driven_on_leg / total_miles
            } else {
                1.0
            };
            let stop_position = position_on_leg(&route.geometry, fraction, position);
            let after = Headroom::measure(recorder.clock(), &rules, remaining);
            if let Some(need) = after.first_need(
                post_drive_order(rules.stop_ordering),
                rules.exhaustion_epsilon_hours,
            ) {
                insert_rest(recorder, need, stop_position, &mut report);
            }
        }
    }

    debug!(
        "{leg}: {:.1} mi in {:.2}h with {} stop(s)",
        report.miles_driven,
        report.drive_hours,
        report.rests.len()
    );
    report
}
