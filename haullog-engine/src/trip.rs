//! Trip orchestration: collaborator lookups followed by the duty simulation.
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::clock::DutyStatus;
use crate::constants::{
    REMARK_LOADING, REMARK_PRE_TRIP, REMARK_TRIP_COMPLETE, REMARK_TRIP_START, REMARK_UNLOADING,
};
use crate::geometry::Coordinate;
use crate::leg::{LegId, LegReport, RouteLeg, drive_leg};
use crate::recorder::{DutyRecorder, EventTrace, LogEntry, Stop, StopKind};
use crate::rules::{HosRules, RulesError};
use crate::summary::{TripSummary, build_summary};

/// Resolves a free-form place name to a coordinate.
///
/// Implementations wrap a geocoding service or a static gazetteer.
pub trait LocationResolver {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Look up `name`, returning `Ok(None)` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn resolve_location(&self, name: &str) -> Result<Option<Coordinate>, Self::Error>;
}

/// Fetches driving distance and geometry between two coordinates.
pub trait RouteProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the route from `origin` to `destination`, `Ok(None)` when unroutable.
    ///
    /// # Errors
    ///
    /// Returns an error if the routing backend fails.
    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<RouteLeg>, Self::Error>;
}

/// Named trip waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waypoint {
    Current,
    Pickup,
    Dropoff,
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Current => "current",
            Self::Pickup => "pickup",
            Self::Dropoff => "dropoff",
        })
    }
}

/// Terminal failures raised before any duty event is recorded.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TripError {
    #[error("Could not locate {which} location: {name}")]
    UnresolvableLocation { which: Waypoint, name: String },
    #[error("Could not calculate route from {}.", leg_span(.which))]
    UnroutableLeg { which: LegId },
    #[error("Invalid hours-of-service rules: {0}")]
    InvalidRules(#[from] RulesError),
}

fn leg_span(leg: &LegId) -> String {
    let (from, to) = leg.endpoints();
    format!("{from} to {to}")
}

/// Place names and carried-over cycle hours for one schedule request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub current: String,
    pub pickup: String,
    pub dropoff: String,
    #[serde(default, rename = "cycle")]
    pub cycle_hours_used: f64,
}

/// Resolved coordinates of the three waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoints {
    pub current: Coordinate,
    pub pickup: Coordinate,
    pub dropoff: Coordinate,
}

/// GeoJSON `LineString` geometry of one leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Coordinate>,
}

impl LineString {
    #[must_use]
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self {
            kind: "LineString".to_string(),
            coordinates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    pub leg1: LineString,
    pub leg2: LineString,
}

/// Complete schedule for one trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripResult {
    pub logs: Vec<LogEntry>,
    pub stops: Vec<Stop>,
    pub route_geometry: RouteGeometry,
    pub summary: TripSummary,
}

impl TripResult {
    /// Canonical JSON rendering of the result.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the result cannot be rendered.
    pub fn try_to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// [`TripResult::try_to_json`], logging a failure and rendering it as an
    /// empty string.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.try_to_json().unwrap_or_else(|err| {
            warn!("trip result could not be serialized: {err}");
            String::new()
        })
    }

    /// xxHash64 of the canonical JSON; equal inputs always produce equal digests.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(self.to_json().as_bytes());
        hasher.finish()
    }
}

/// Wire shape of a schedule response: the result itself or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleResponse {
    Trip(Box<TripResult>),
    Error { error: String },
}

impl From<Result<TripResult, TripError>> for ScheduleResponse {
    fn from(value: Result<TripResult, TripError>) -> Self {
        match value {
            Ok(result) => Self::Trip(Box::new(result)),
            Err(err) => Self::Error {
                error: err.to_string(),
            },
        }
    }
}

/// Simulation output together with per-leg reports and optional clock trace.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedTrip {
    pub result: TripResult,
    pub legs: [LegReport; 2],
    pub trace: Vec<EventTrace>,
}

fn sanitize_cycle_hours(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!("cycle hours {value} is not a non-negative number; starting from 0");
        0.0
    }
}

fn run_trip(
    rules: &HosRules,
    waypoints: &Waypoints,
    legs: (&RouteLeg, &RouteLeg),
    cycle_hours_used: f64,
    traced: bool,
) -> SimulatedTrip {
    let (leg1, leg2) = legs;
    let cycle_hours_used = sanitize_cycle_hours(cycle_hours_used);
    info!(
        "simulating trip: {:.1} mi + {:.1} mi with {cycle_hours_used:.1}h of cycle used",
        leg1.distance_miles, leg2.distance_miles
    );

    let mut recorder = DutyRecorder::new(*rules, cycle_hours_used);
    if traced {
        recorder = recorder.with_trace();
    }

    recorder.add_marker(StopKind::Start, waypoints.current, REMARK_TRIP_START);
    recorder.add_event(
        DutyStatus::OnDuty,
        rules.pre_trip_hours,
        waypoints.current,
        REMARK_PRE_TRIP,
        Some(StopKind::Inspection),
    );

    let first = drive_leg(&mut recorder, LegId::ToPickup, waypoints.current, leg1);
    recorder.add_event(
        DutyStatus::OnDuty,
        rules.load_unload_hours,
        waypoints.pickup,
        REMARK_LOADING,
        Some(StopKind::Pickup),
    );

    let second = drive_leg(&mut recorder, LegId::ToDropoff, waypoints.pickup, leg2);
    recorder.add_event(
        DutyStatus::OnDuty,
        rules.load_unload_hours,
        waypoints.dropoff,
        REMARK_UNLOADING,
        Some(StopKind::Dropoff),
    );
    recorder.add_marker(StopKind::End, waypoints.dropoff, REMARK_TRIP_COMPLETE);

    let (clock, logs, stops, trace) = recorder.finish();
    let summary = build_summary(
        &logs,
        &stops,
        (leg1.distance_miles, leg2.distance_miles),
        clock.current_time(),
        rules.day_start_hour,
    );
    info!(
        "trip complete: {} log entries, {} stops, {:.1}h over {} day(s)",
        logs.len(),
        stops.len(),
        summary.total_trip_time,
        summary.num_days
    );

    SimulatedTrip {
        result: TripResult {
            logs,
            stops,
            route_geometry: RouteGeometry {
                leg1: LineString::new(leg1.geometry.clone()),
                leg2: LineString::new(leg2.geometry.clone()),
            },
            summary,
        },
        legs: [first, second],
        trace,
    }
}

/// Run the duty simulation over already-fetched waypoints and legs.
///
/// # Errors
///
/// Returns [`TripError::InvalidRules`] when `rules` fail validation; nothing
/// is simulated in that case.
pub fn simulate_trip(
    rules: &HosRules,
    waypoints: &Waypoints,
    leg1: &RouteLeg,
    leg2: &RouteLeg,
    cycle_hours_used: f64,
) -> Result<TripResult, TripError> {
    rules.validate()?;
    Ok(run_trip(rules, waypoints, (leg1, leg2), cycle_hours_used, false).result)
}

/// Like [`simulate_trip`], additionally returning leg reports and a clock
/// snapshot taken before every logged event.
///
/// # Errors
///
/// Same failure modes as [`simulate_trip`].
pub fn simulate_trip_traced(
    rules: &HosRules,
    waypoints: &Waypoints,
    leg1: &RouteLeg,
    leg2: &RouteLeg,
    cycle_hours_used: f64,
) -> Result<SimulatedTrip, TripError> {
    rules.validate()?;
    Ok(run_trip(rules, waypoints, (leg1, leg2), cycle_hours_used, true))
}

/// Binds the collaborators and rules used to plan trips.
pub struct TripPlanner<R, P>
where
    R: LocationResolver,
    P: RouteProvider,
{
    resolver: R,
    router: P,
    rules: HosRules,
}

impl<R, P> TripPlanner<R, P>
where
    R: LocationResolver,
    P: RouteProvider,
{
    /// Create a planner using the FMCSA default rules.
    pub const fn new(resolver: R, router: P) -> Self {
        Self {
            resolver,
            router,
            rules: HosRules::fmcsa(),
        }
    }

    #[must_use]
    pub const fn with_rules(mut self, rules: HosRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub const fn rules(&self) -> &HosRules {
        &self.rules
    }

    fn resolve(&self, which: Waypoint, name: &str) -> Result<Coordinate, TripError> {
        match self.resolver.resolve_location(name) {
            Ok(Some(coordinate)) => {
                debug!("resolved {which} location {name:?} to {coordinate}");
                Ok(coordinate)
            }
            Ok(None) => Err(TripError::UnresolvableLocation {
                which,
                name: name.to_string(),
            }),
            Err(err) => {
                warn!("geocoding {which} location {name:?} failed: {err}");
                Err(TripError::UnresolvableLocation {
                    which,
                    name: name.to_string(),
                })
            }
        }
    }

    fn route(&self, which: LegId, from: Coordinate, to: Coordinate) -> Result<RouteLeg, TripError> {
        match self.router.fetch_route(from, to) {
            Ok(Some(leg)) if leg.distance_miles.is_finite() && leg.distance_miles >= 0.0 => {
                Ok(leg)
            }
            Ok(Some(leg)) => {
                warn!(
                    "routing {which} ({from} -> {to}) returned unusable distance {}",
                    leg.distance_miles
                );
                Err(TripError::UnroutableLeg { which })
            }
            Ok(None) => Err(TripError::UnroutableLeg { which }),
            Err(err) => {
                warn!("routing {which} ({from} -> {to}) failed: {err}");
                Err(TripError::UnroutableLeg { which })
            }
        }
    }

    /// Resolve every waypoint and fetch both legs; nothing is simulated yet.
    ///
    /// # Errors
    ///
    /// Returns [`TripError::InvalidRules`] before any lookup when the bound
    /// rules fail validation, then the first unresolvable waypoint or
    /// unroutable leg. A leg whose distance is negative or not finite counts
    /// as unroutable.
    pub fn prepare(
        &self,
        request: &TripRequest,
    ) -> Result<(Waypoints, RouteLeg, RouteLeg), TripError> {
        self.rules.validate()?;
        let waypoints = Waypoints {
            current: self.resolve(Waypoint::Current, &request.current)?,
            pickup: self.resolve(Waypoint::Pickup, &request.pickup)?,
            dropoff: self.resolve(Waypoint::Dropoff, &request.dropoff)?,
        };
        let leg1 = self.route(LegId::ToPickup, waypoints.current, waypoints.pickup)?;
        let leg2 = self.route(LegId::ToDropoff, waypoints.pickup, waypoints.dropoff)?;
        Ok((waypoints, leg1, leg2))
    }

    /// Compute the full schedule for `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`TripError`] when the rules are invalid, a waypoint cannot
    /// be located or a leg cannot be routed; no partial schedule is produced.
    pub fn plan(&self, request: &TripRequest) -> Result<TripResult, TripError> {
        let (waypoints, leg1, leg2) = self.prepare(request)?;
        simulate_trip(
            &self.rules,
            &waypoints,
            &leg1,
            &leg2,
            request.cycle_hours_used,
        )
    }

    /// [`TripPlanner::plan`] with leg reports and the per-event clock trace.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`TripPlanner::plan`].
    pub fn plan_traced(&self, request: &TripRequest) -> Result<SimulatedTrip, TripError> {
        let (waypoints, leg1, leg2) = self.prepare(request)?;
        simulate_trip_traced(
            &self.rules,
            &waypoints,
            &leg1,
            &leg2,
            request.cycle_hours_used,
        )
    }
}

/// Compute a schedule with the default rules.
///
/// # Errors
///
/// Returns a [`TripError`] when a waypoint cannot be located or a leg cannot
/// be routed.
pub fn compute_schedule<R, P>(
    resolver: &R,
    router: &P,
    current: &str,
    pickup: &str,
    dropoff: &str,
    cycle_hours_used: f64,
) -> Result<TripResult, TripError>
where
    R: LocationResolver,
    P: RouteProvider,
{
    let planner = TripPlanner::new(resolver, router);
    planner.plan(&TripRequest {
        current: current.to_string(),
        pickup: pickup.to_string(),
        dropoff: dropoff.to_string(),
        cycle_hours_used,
    })
}

impl<T: LocationResolver + ?Sized> LocationResolver for &T {
    type Error = T::Error;

    fn resolve_location(&self, name: &str) -> Result<Option<Coordinate>, Self::Error> {
        (**self).resolve_location(name)
    }
}

impl<T: RouteProvider + ?Sized> RouteProvider for &T {
    type Error = T::Error;

    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<RouteLeg>, Self::Error> {
        (**self).fetch_route(origin, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;

    #[derive(Default)]
    struct Gazetteer {
        places: HashMap<String, Coordinate>,
        lookups: RefCell<Vec<String>>,
    }

    impl Gazetteer {
        fn with(mut self, name: &str, lon: f64, lat: f64) -> Self {
            self.places.insert(name.to_string(), Coordinate::new(lon, lat));
            self
        }
    }

    impl LocationResolver for Gazetteer {
        type Error = Infallible;

        fn resolve_location(&self, name: &str) -> Result<Option<Coordinate>, Self::Error> {
            self.lookups.borrow_mut().push(name.to_string());
            Ok(self.places.get(name).copied())
        }
    }

    /// Straight-line router charging a fixed number of miles per degree.
    struct StraightRouter {
        miles_per_degree: f64,
        unroutable_from: Option<Coordinate>,
    }

    impl RouteProvider for StraightRouter {
        type Error = Infallible;

        fn fetch_route(
            &self,
            origin: Coordinate,
            destination: Coordinate,
        ) -> Result<Option<RouteLeg>, Self::Error> {
            if self.unroutable_from == Some(origin) {
                return Ok(None);
            }
            Ok(Some(RouteLeg::new(
                origin.planar_distance(destination) * self.miles_per_degree,
                vec![origin, destination],
            )))
        }
    }

    fn gazetteer() -> Gazetteer {
        Gazetteer::default()
            .with("Depot", 0.0, 0.0)
            .with("Mill", 1.0, 0.0)
            .with("Port", 3.0, 0.0)
    }

    fn router() -> StraightRouter {
        StraightRouter {
            miles_per_degree: 50.0,
            unroutable_from: None,
        }
    }

    fn request(pickup: &str) -> TripRequest {
        TripRequest {
            current: "Depot".to_string(),
            pickup: pickup.to_string(),
            dropoff: "Port".to_string(),
            cycle_hours_used: 0.0,
        }
    }

    #[test]
    fn plan_brackets_legs_with_fixed_duty_events() {
        let planner = TripPlanner::new(gazetteer(), router());
        let result = planner.plan(&request("Mill")).expect("trip plans");

        let remarks: Vec<&str> = result.logs.iter().map(|e| e.remarks.as_str()).collect();
        assert_eq!(
            remarks,
            vec![
                "Pre-trip Inspection",
                "En Route (to Pickup)",
                "Loading at Pickup",
                "En Route (to Dropoff)",
                "Unloading at Dropoff",
            ]
        );
        let kinds: Vec<StopKind> = result.stops.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StopKind::Start,
                StopKind::Inspection,
                StopKind::Pickup,
                StopKind::Dropoff,
                StopKind::End,
            ]
        );
        assert_eq!(result.stops[2].coords, Coordinate::new(1.0, 0.0));
        assert!((result.summary.total_miles - 150.0).abs() < 1e-9);
        assert_eq!(result.summary.num_stops, 5);
        assert_eq!(result.route_geometry.leg1.kind, "LineString");
    }

    #[test]
    fn unresolvable_pickup_fails_before_routing() {
        let gazetteer = gazetteer();
        let err = TripPlanner::new(&gazetteer, router())
            .plan(&request("Atlantis"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not locate pickup location: Atlantis"
        );
        assert_eq!(*gazetteer.lookups.borrow(), vec!["Depot", "Atlantis"]);
    }

    #[test]
    fn unroutable_second_leg_names_the_leg() {
        let router = StraightRouter {
            miles_per_degree: 50.0,
            unroutable_from: Some(Coordinate::new(1.0, 0.0)),
        };
        let err = TripPlanner::new(gazetteer(), router)
            .plan(&request("Mill"))
            .unwrap_err();
        assert_eq!(
            err,
            TripError::UnroutableLeg {
                which: LegId::ToDropoff
            }
        );
        assert_eq!(
            err.to_string(),
            "Could not calculate route from Pickup to Dropoff."
        );
        assert_eq!(
            TripError::UnroutableLeg {
                which: LegId::ToPickup
            }
            .to_string(),
            "Could not calculate route from Current Location to Pickup."
        );
    }

    #[test]
    fn response_renders_error_object() {
        let response = ScheduleResponse::from(compute_schedule(
            &gazetteer(),
            &router(),
            "Depot",
            "Atlantis",
            "Port",
            0.0,
        ));
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"error": "Could not locate pickup location: Atlantis"})
        );
    }

    /// Router whose every leg reports the same fixed distance.
    struct FixedDistanceRouter(f64);

    impl RouteProvider for FixedDistanceRouter {
        type Error = Infallible;

        fn fetch_route(
            &self,
            origin: Coordinate,
            destination: Coordinate,
        ) -> Result<Option<RouteLeg>, Self::Error> {
            Ok(Some(RouteLeg::new(self.0, vec![origin, destination])))
        }
    }

    #[test]
    fn unusable_route_distance_is_unroutable() {
        for distance in [f64::INFINITY, f64::NAN, -12.0] {
            let err = TripPlanner::new(gazetteer(), FixedDistanceRouter(distance))
                .plan(&request("Mill"))
                .unwrap_err();
            assert_eq!(
                err,
                TripError::UnroutableLeg {
                    which: LegId::ToPickup
                }
            );
        }
    }

    #[test]
    fn invalid_rules_are_rejected_before_lookups() {
        let gazetteer = gazetteer();
        let rules = HosRules {
            avg_speed_mph: 0.0,
            ..HosRules::default()
        };
        let err = TripPlanner::new(&gazetteer, router())
            .with_rules(rules)
            .plan(&request("Mill"))
            .unwrap_err();
        assert_eq!(
            err,
            TripError::InvalidRules(RulesError::NonPositive {
                field: "avg_speed_mph",
                value: 0.0,
            })
        );
        assert!(gazetteer.lookups.borrow().is_empty());
    }

    #[test]
    fn simulate_trip_refuses_invalid_rules() {
        let waypoints = Waypoints {
            current: Coordinate::new(0.0, 0.0),
            pickup: Coordinate::new(1.0, 0.0),
            dropoff: Coordinate::new(2.0, 0.0),
        };
        let leg = RouteLeg::new(600.0, vec![waypoints.current, waypoints.pickup]);
        let rules = HosRules {
            sleeper_rest_hours: -1.0,
            ..HosRules::default()
        };
        let outcome = simulate_trip(&rules, &waypoints, &leg, &leg, 0.0);
        assert!(matches!(outcome, Err(TripError::InvalidRules(_))));
        assert_eq!(
            ScheduleResponse::from(outcome),
            ScheduleResponse::Error {
                error: "Invalid hours-of-service rules: sleeper_rest_hours must be positive \
                        (got -1.000)"
                    .to_string()
            }
        );
    }

    #[test]
    fn json_rendering_is_fallible_and_hashed() {
        let waypoints = Waypoints {
            current: Coordinate::new(0.0, 0.0),
            pickup: Coordinate::new(1.0, 0.0),
            dropoff: Coordinate::new(2.0, 0.0),
        };
        let leg = RouteLeg::new(20.0, vec![waypoints.current, waypoints.pickup]);
        let result = simulate_trip(&HosRules::default(), &waypoints, &leg, &leg, 0.0)
            .expect("default rules are valid");
        let json = result.try_to_json().expect("result serializes");
        assert!(!json.is_empty());
        assert_eq!(json, result.to_json());
    }

    #[test]
    fn invalid_cycle_hours_start_from_zero() {
        let waypoints = Waypoints {
            current: Coordinate::new(0.0, 0.0),
            pickup: Coordinate::new(1.0, 0.0),
            dropoff: Coordinate::new(2.0, 0.0),
        };
        let leg = RouteLeg::new(10.0, vec![waypoints.current, waypoints.pickup]);
        let traced = simulate_trip_traced(&HosRules::default(), &waypoints, &leg, &leg, f64::NAN)
            .expect("default rules are valid");
        assert!((traced.trace[0].clock_before.cycle_used() - 0.0).abs() < f64::EPSILON);
        assert_eq!(traced.trace.len(), traced.result.logs.len());
    }
}
