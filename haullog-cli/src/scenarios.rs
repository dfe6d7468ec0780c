//! Built-in trip scenarios run against synthetic straight-line atlases.
use std::time::{Duration, Instant};

use haullog_engine::{
    Coordinate, DutyStatus, HosRules, SimulatedTrip, StopKind, TripError, TripPlanner,
    TripRequest, TripSummary,
};
use log::{debug, info};
use serde::Serialize;

use crate::atlas::FixtureAtlas;

const DEPOT: (&str, Coordinate) = ("Depot", Coordinate::new(-97.0, 35.0));
const SHIPPER: (&str, Coordinate) = ("Shipper", Coordinate::new(-95.0, 35.0));
const RECEIVER: (&str, Coordinate) = ("Receiver", Coordinate::new(-91.0, 35.0));
const SLACK: f64 = 1e-6;

/// What a scenario expects from the planner.
#[derive(Debug, Clone, Copy)]
enum Expectation {
    ShortHaul,
    CycleRestart,
    SingleFuelStop,
    UnknownPickup,
    MultiDay,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    leg_miles: [f64; 2],
    cycle: f64,
    pickup: &'static str,
    expectation: Expectation,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub checks_run: usize,
    pub failures: Vec<String>,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TripSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            key: "short-haul",
            description: "Short legs that need no rest or fuel",
            leg_miles: [50.0, 20.0],
            cycle: 0.0,
            pickup: SHIPPER.0,
            expectation: Expectation::ShortHaul,
        },
        Scenario {
            key: "cycle-restart",
            description: "Nearly spent cycle forces a restart before driving",
            leg_miles: [120.0, 40.0],
            cycle: 69.9,
            pickup: SHIPPER.0,
            expectation: Expectation::CycleRestart,
        },
        Scenario {
            key: "long-haul-fuel",
            description: "1,100 mile first leg takes exactly one fuel stop",
            leg_miles: [1_100.0, 30.0],
            cycle: 0.0,
            pickup: SHIPPER.0,
            expectation: Expectation::SingleFuelStop,
        },
        Scenario {
            key: "unknown-pickup",
            description: "Unresolvable pickup yields only an error",
            leg_miles: [50.0, 20.0],
            cycle: 0.0,
            pickup: "Nowhere Junction",
            expectation: Expectation::UnknownPickup,
        },
        Scenario {
            key: "multi-day",
            description: "Cross-country haul spanning several sleeper periods",
            leg_miles: [400.0, 1_800.0],
            cycle: 20.0,
            pickup: SHIPPER.0,
            expectation: Expectation::MultiDay,
        },
    ]
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

pub fn get_scenario(name: &str) -> Option<Scenario> {
    catalog().into_iter().find(|scenario| scenario.key == name)
}

/// Expand `all` into every catalog key, keeping any explicit names.
pub fn expand_scenarios(names: Vec<String>) -> Vec<String> {
    if !names.iter().any(|name| name == "all") {
        return names;
    }
    let mut expanded: Vec<String> = names.into_iter().filter(|name| name != "all").collect();
    for (key, _) in list_scenarios() {
        if !expanded.iter().any(|name| name == key) {
            expanded.push(key.to_string());
        }
    }
    expanded
}

struct Checks {
    run: usize,
    failures: Vec<String>,
}

impl Checks {
    const fn new() -> Self {
        Self {
            run: 0,
            failures: Vec::new(),
        }
    }

    fn expect(&mut self, ok: bool, message: impl FnOnce() -> String) {
        self.run += 1;
        if !ok {
            self.failures.push(message());
        }
    }
}

impl Scenario {
    fn request(&self) -> TripRequest {
        TripRequest {
            current: DEPOT.0.to_string(),
            pickup: self.pickup.to_string(),
            dropoff: RECEIVER.0.to_string(),
            cycle_hours_used: self.cycle,
        }
    }

    fn atlas(&self) -> FixtureAtlas {
        FixtureAtlas::straight_line(&[DEPOT, SHIPPER, RECEIVER], &self.leg_miles)
    }

    pub fn run(&self, rules: &HosRules) -> ScenarioResult {
        info!("running scenario {}", self.key);
        let started = Instant::now();
        let planner = TripPlanner::new(self.atlas(), self.atlas()).with_rules(*rules);
        let outcome = planner.plan_traced(&self.request());
        let elapsed = started.elapsed();

        let mut checks = Checks::new();
        self.check(rules, &outcome, &mut checks);
        debug!(
            "scenario {}: {} checks, {} failures",
            self.key,
            checks.run,
            checks.failures.len()
        );

        let (summary, digest) = outcome.as_ref().map_or((None, None), |trip| {
            (
                Some(trip.result.summary.clone()),
                Some(format!("{:016x}", trip.result.digest())),
            )
        });
        ScenarioResult {
            scenario_name: self.key.to_string(),
            passed: checks.failures.is_empty(),
            checks_run: checks.run,
            failures: checks.failures,
            elapsed_ms: millis(elapsed),
            summary,
            digest,
        }
    }

    fn check(
        &self,
        rules: &HosRules,
        outcome: &Result<SimulatedTrip, TripError>,
        checks: &mut Checks,
    ) {
        if let Expectation::UnknownPickup = self.expectation {
            let expected = format!("Could not locate pickup location: {}", self.pickup);
            match outcome {
                Ok(_) => checks.expect(false, || "expected an error, got a schedule".to_string()),
                Err(err) => checks.expect(err.to_string() == expected, || {
                    format!("expected {expected:?}, got {:?}", err.to_string())
                }),
            }
            return;
        }

        let trip = match outcome {
            Ok(trip) => trip,
            Err(err) => {
                checks.expect(false, || format!("planning failed: {err}"));
                return;
            }
        };
        check_common(rules, trip, self.leg_miles, checks);

        let stops = &trip.result.stops;
        let count = |kind: StopKind| stops.iter().filter(|stop| stop.kind == kind).count();
        match self.expectation {
            Expectation::ShortHaul => {
                let rests = count(StopKind::Fuel)
                    + count(StopKind::Break)
                    + count(StopKind::Sleep)
                    + count(StopKind::Restart);
                checks.expect(rests == 0, || format!("expected no rests, saw {rests}"));
                checks.expect(trip.result.summary.num_days == 1, || {
                    format!("expected 1 day, saw {}", trip.result.summary.num_days)
                });
            }
            Expectation::CycleRestart => {
                let second = trip.result.logs.get(1);
                checks.expect(
                    second.is_some_and(|entry| {
                        entry.status == DutyStatus::OffDuty
                            && (entry.duration() - rules.restart_hours).abs() < SLACK
                    }),
                    || format!("second log entry is not a restart: {second:?}"),
                );
                checks.expect(trip.legs[0].rests.first() == Some(&StopKind::Restart), || {
                    format!("first leg rests: {:?}", trip.legs[0].rests)
                });
            }
            Expectation::SingleFuelStop => {
                let fuel = count(StopKind::Fuel);
                checks.expect(fuel == 1, || format!("expected 1 fuel stop, saw {fuel}"));
            }
            Expectation::MultiDay => {
                let days = trip.result.summary.num_days;
                checks.expect(days >= 3, || format!("expected at least 3 days, saw {days}"));
                checks.expect(count(StopKind::Sleep) >= 1, || {
                    "expected at least one sleeper period".to_string()
                });
            }
            Expectation::UnknownPickup => {}
        }
    }
}

/// Checks every successful trip must pass regardless of scenario.
fn check_common(
    rules: &HosRules,
    trip: &SimulatedTrip,
    leg_miles: [f64; 2],
    checks: &mut Checks,
) {
    let logs = &trip.result.logs;
    checks.expect(!logs.is_empty(), || "no log entries".to_string());
    let gaps = logs
        .windows(2)
        .filter(|pair| (pair[0].end - pair[1].start).abs() > SLACK)
        .count();
    checks.expect(gaps == 0, || format!("{gaps} gap(s) between log entries"));

    let over_limit = trip
        .trace
        .iter()
        .filter(|event| event.status == DutyStatus::Driving)
        .filter(|event| {
            let clock = &event.clock_before;
            clock.drive_clock() > rules.max_drive_hours + SLACK
                || clock.window_clock() > rules.max_duty_window_hours + SLACK
                || clock.since_break_clock() > rules.break_required_after_hours + SLACK
                || clock.cycle_used() > rules.max_cycle_hours + SLACK
        })
        .count();
    checks.expect(over_limit == 0, || {
        format!("{over_limit} driving segment(s) started over a limit")
    });

    for (report, miles) in trip.legs.iter().zip(leg_miles) {
        let driven = report.drive_hours * rules.avg_speed_mph;
        checks.expect((driven - miles).abs() <= rules.arrival_tolerance_miles, || {
            format!("{} drove {driven:.2} of {miles:.2} mi", report.leg)
        });
    }
}

#[allow(clippy::cast_precision_loss)]
fn millis(elapsed: Duration) -> f64 {
    elapsed.as_micros() as f64 / 1_000.0
}

pub fn run_scenarios(names: &[String], rules: &HosRules) -> (Vec<ScenarioResult>, Vec<String>) {
    let mut results = Vec::new();
    let mut unknown = Vec::new();
    for name in names {
        match get_scenario(name) {
            Some(scenario) => results.push(scenario.run(rules)),
            None => unknown.push(name.clone()),
        }
    }
    (results, unknown)
}
