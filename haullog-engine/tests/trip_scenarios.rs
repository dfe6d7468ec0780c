use std::collections::HashMap;
use std::convert::Infallible;

use haullog_engine::{
    Coordinate, DutyStatus, LocationResolver, RouteLeg, RouteProvider, ScheduleResponse,
    StopKind, TripPlanner, TripRequest, compute_schedule,
};

/// Gazetteer with fixed coordinates.
struct Atlas {
    places: HashMap<&'static str, Coordinate>,
}

impl LocationResolver for Atlas {
    type Error = Infallible;

    fn resolve_location(&self, name: &str) -> Result<Option<Coordinate>, Self::Error> {
        Ok(self.places.get(name).copied())
    }
}

/// Router returning pre-baked legs keyed by (origin, destination) longitude.
struct CannedRoutes {
    legs: Vec<(Coordinate, Coordinate, f64)>,
}

impl RouteProvider for CannedRoutes {
    type Error = Infallible;

    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<RouteLeg>, Self::Error> {
        Ok(self
            .legs
            .iter()
            .find(|(from, to, _)| *from == origin && *to == destination)
            .map(|&(from, to, miles)| {
                RouteLeg::new(miles, vec![from, from.lerp(to, 0.5), to])
            }))
    }
}

const YARD: Coordinate = Coordinate::new(-87.65, 41.85);
const WAREHOUSE: Coordinate = Coordinate::new(-89.65, 39.80);
const TERMINAL: Coordinate = Coordinate::new(-90.20, 38.63);

fn atlas() -> Atlas {
    Atlas {
        places: HashMap::from([
            ("Chicago, IL", YARD),
            ("Springfield, IL", WAREHOUSE),
            ("St. Louis, MO", TERMINAL),
        ]),
    }
}

fn routes(leg1_miles: f64, leg2_miles: f64) -> CannedRoutes {
    CannedRoutes {
        legs: vec![(YARD, WAREHOUSE, leg1_miles), (WAREHOUSE, TERMINAL, leg2_miles)],
    }
}

fn request(cycle: f64) -> TripRequest {
    TripRequest {
        current: "Chicago, IL".to_string(),
        pickup: "Springfield, IL".to_string(),
        dropoff: "St. Louis, MO".to_string(),
        cycle_hours_used: cycle,
    }
}

#[test]
fn short_leg_drives_once_then_loads() {
    let result = TripPlanner::new(atlas(), routes(50.0, 20.0))
        .plan(&request(0.0))
        .expect("trip plans");

    let logs = &result.logs;
    assert_eq!(logs[0].remarks, "Pre-trip Inspection");
    assert_eq!(logs[1].status, DutyStatus::Driving);
    assert!((logs[1].duration() - 50.0 / 55.0).abs() < 1e-3);
    assert_eq!(logs[2].status, DutyStatus::OnDuty);
    assert_eq!(logs[2].remarks, "Loading at Pickup");
    assert!((logs[2].duration() - 1.0).abs() < 1e-9);

    assert!(result.stops.iter().all(|stop| !matches!(
        stop.kind,
        StopKind::Fuel | StopKind::Break | StopKind::Sleep | StopKind::Restart
    )));
    assert_eq!(result.summary.num_days, 1);
    assert!((result.summary.total_miles - 70.0).abs() < 1e-9);
}

#[test]
fn nearly_spent_cycle_restarts_before_driving() {
    let planner = TripPlanner::new(atlas(), routes(120.0, 40.0));
    let traced = planner.plan_traced(&request(69.9)).expect("trip plans");
    let logs = &traced.result.logs;

    assert_eq!(logs[0].remarks, "Pre-trip Inspection");
    assert!((logs[0].duration() - 0.25).abs() < 1e-9);
    assert_eq!(logs[1].status, DutyStatus::OffDuty);
    assert_eq!(logs[1].remarks, "34-hr Restart (Cycle Reset)");
    assert!((logs[1].duration() - 34.0).abs() < 1e-9);
    assert_eq!(logs[2].status, DutyStatus::Driving);

    // Snapshot before the first DRIVING entry shows the cycle already reset.
    assert!((traced.trace[2].clock_before.cycle_used() - 0.0).abs() < f64::EPSILON);
    assert_eq!(traced.legs[0].rests.first(), Some(&StopKind::Restart));
    assert_eq!(traced.result.stops[2].kind, StopKind::Restart);
    assert_eq!(traced.result.stops[2].coords, YARD);
}

#[test]
fn long_leg_takes_exactly_one_fuel_stop() {
    let planner = TripPlanner::new(atlas(), routes(1_100.0, 30.0));
    let traced = planner.plan_traced(&request(0.0)).expect("trip plans");

    let fuel_stops: Vec<_> = traced
        .result
        .stops
        .iter()
        .filter(|stop| stop.kind == StopKind::Fuel)
        .collect();
    assert_eq!(fuel_stops.len(), 1);
    assert!((fuel_stops[0].duration - 0.5).abs() < 1e-9);

    let fuel_idx = traced
        .trace
        .iter()
        .position(|event| event.stop == Some(StopKind::Fuel))
        .expect("fuel event traced");
    assert_eq!(traced.trace[fuel_idx].status, DutyStatus::OnDuty);
    assert_eq!(traced.result.logs[fuel_idx].remarks, "Fuel Stop");
    assert!(traced.trace[fuel_idx].clock_before.miles_since_fuel() >= 999.5);
    assert!(
        (traced.trace[fuel_idx + 1]
            .clock_before
            .miles_since_fuel()
            - 0.0)
            .abs()
            < f64::EPSILON
    );
    assert_eq!(
        traced.legs[0].rests,
        vec![StopKind::Break, StopKind::Sleep, StopKind::Fuel]
    );
}

#[test]
fn unknown_pickup_yields_error_only() {
    let outcome = compute_schedule(
        &atlas(),
        &routes(50.0, 20.0),
        "Chicago, IL",
        "Nowhere Junction",
        "St. Louis, MO",
        0.0,
    );
    let response = ScheduleResponse::from(outcome);
    let json = serde_json::to_value(&response).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!({"error": "Could not locate pickup location: Nowhere Junction"})
    );
    assert!(json.get("logs").is_none());
    assert!(json.get("stops").is_none());
}

#[test]
fn unroutable_first_leg_reports_current_to_pickup() {
    let empty = CannedRoutes { legs: Vec::new() };
    let err = TripPlanner::new(atlas(), empty)
        .plan(&request(0.0))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not calculate route from Current Location to Pickup."
    );
}

#[test]
fn trip_result_serializes_wire_shape() {
    let result = TripPlanner::new(atlas(), routes(50.0, 20.0))
        .plan(&request(0.0))
        .expect("trip plans");
    let json = serde_json::to_value(&result).expect("serialize");

    assert_eq!(json["logs"][0]["status"], "ON_DUTY");
    assert_eq!(json["logs"][1]["status"], "DRIVING");
    assert_eq!(json["logs"][0]["start"], 6.0);
    assert_eq!(json["stops"][0]["type"], "start");
    assert_eq!(json["stops"][0]["remark"], "Trip Start");
    assert_eq!(json["stops"].as_array().map(Vec::len), Some(5));
    assert_eq!(json["route_geometry"]["leg1"]["type"], "LineString");
    assert_eq!(json["route_geometry"]["leg2"]["coordinates"][0][0], -89.65);
    for field in [
        "total_miles",
        "leg1_miles",
        "leg2_miles",
        "total_drive_time",
        "total_rest_time",
        "total_on_duty_time",
        "total_trip_time",
        "num_stops",
        "num_days",
    ] {
        assert!(json["summary"].get(field).is_some(), "missing {field}");
    }
}
