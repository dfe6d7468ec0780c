//! Haullog Schedule Engine
//!
//! Platform-agnostic Hours-of-Service duty simulation for a three-waypoint
//! truck trip. Geocoding and routing are supplied by the caller through the
//! [`LocationResolver`] and [`RouteProvider`] traits; everything after those
//! lookups is pure and deterministic.

pub mod clock;
pub mod constants;
pub mod geometry;
pub mod leg;
pub mod numbers;
pub mod recorder;
pub mod rules;
pub mod summary;
pub mod trip;

// Re-export commonly used types
pub use clock::{ClockState, DutyStatus};
pub use geometry::{Coordinate, interpolate_along};
pub use leg::{Headroom, LegId, LegReport, RestNeed, RouteLeg, drive_leg};
pub use recorder::{DutyRecorder, EventTrace, LogEntry, Stop, StopKind};
pub use rules::{HosRules, RulesError, StopOrdering};
pub use summary::{TripSummary, build_summary};
pub use trip::{
    LineString, LocationResolver, RouteGeometry, RouteProvider, ScheduleResponse, SimulatedTrip,
    TripError, TripPlanner, TripRequest, TripResult, Waypoint, Waypoints, compute_schedule,
    simulate_trip, simulate_trip_traced,
};
