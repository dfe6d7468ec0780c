//! Centralized regulatory defaults and remark text for the duty simulation.
//!
//! The numeric values mirror the FMCSA property-carrying driver limits. They
//! seed [`crate::rules::HosRules`], which is what the simulation actually reads,
//! so amended limits can be injected without touching this file.

// Regulatory limits ----------------------------------------------------------
pub(crate) const MAX_DRIVE_HOURS: f64 = 11.0;
pub(crate) const MAX_DUTY_WINDOW_HOURS: f64 = 14.0;
pub(crate) const BREAK_REQUIRED_AFTER_HOURS: f64 = 8.0;
pub(crate) const MIN_BREAK_HOURS: f64 = 0.5;
pub(crate) const SLEEPER_REST_HOURS: f64 = 10.0;
pub(crate) const RESTART_HOURS: f64 = 34.0;
pub(crate) const MAX_CYCLE_HOURS: f64 = 70.0;

// Operational assumptions ----------------------------------------------------
pub(crate) const FUEL_INTERVAL_MILES: f64 = 1_000.0;
pub(crate) const FUEL_STOP_HOURS: f64 = 0.5;
pub(crate) const LOAD_UNLOAD_HOURS: f64 = 1.0;
pub(crate) const PRE_TRIP_HOURS: f64 = 0.25;
pub(crate) const AVG_SPEED_MPH: f64 = 55.0;
pub(crate) const DAY_START_HOUR: f64 = 6.0;

// Loop tolerances ------------------------------------------------------------
pub(crate) const EXHAUSTION_EPSILON_HOURS: f64 = 0.001;
pub(crate) const ARRIVAL_TOLERANCE_MILES: f64 = 0.5;

// Unit conversion ------------------------------------------------------------
pub(crate) const MILES_PER_METER: f64 = 0.000_621_371;
pub(crate) const HOURS_PER_DAY: f64 = 24.0;

// Output precision -----------------------------------------------------------
pub(crate) const LOG_TIME_DECIMALS: i32 = 3;
pub(crate) const SUMMARY_DECIMALS: i32 = 1;

// Remarks --------------------------------------------------------------------
pub(crate) const REMARK_TRIP_START: &str = "Trip Start";
pub(crate) const REMARK_TRIP_COMPLETE: &str = "Trip Complete";
pub(crate) const REMARK_PRE_TRIP: &str = "Pre-trip Inspection";
pub(crate) const REMARK_LOADING: &str = "Loading at Pickup";
pub(crate) const REMARK_UNLOADING: &str = "Unloading at Dropoff";
pub(crate) const REMARK_RESTART: &str = "34-hr Restart (Cycle Reset)";
pub(crate) const REMARK_SLEEPER: &str = "10-hr Sleeper Berth";
pub(crate) const REMARK_BREAK: &str = "30-min Break";
pub(crate) const REMARK_FUEL: &str = "Fuel Stop";
pub(crate) const REMARK_EN_ROUTE_PREFIX: &str = "En Route";
