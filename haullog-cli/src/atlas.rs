//! In-memory place and route tables standing in for geocoding and routing services.
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::path::Path;

use anyhow::{Context, Result};
use haullog_engine::{Coordinate, LocationResolver, RouteLeg, RouteProvider, TripRequest};
use serde::Deserialize;
use thiserror::Error;

/// One route entry in a trip fixture, keyed by place names.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteFixture {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    #[serde(default)]
    pub distance_meters: Option<f64>,
    #[serde(default)]
    pub geometry: Vec<Coordinate>,
}

/// Trip file accepted by `--trip`.
#[derive(Debug, Clone, Deserialize)]
pub struct TripFixture {
    pub current: String,
    pub pickup: String,
    pub dropoff: String,
    #[serde(default)]
    pub cycle: f64,
    #[serde(default)]
    pub places: BTreeMap<String, Coordinate>,
    #[serde(default)]
    pub routes: Vec<RouteFixture>,
}

impl TripFixture {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read trip fixture {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse trip fixture {}", path.display()))
    }

    pub fn request(&self) -> TripRequest {
        TripRequest {
            current: self.current.clone(),
            pickup: self.pickup.clone(),
            dropoff: self.dropoff.clone(),
            cycle_hours_used: self.cycle,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AtlasError {
    #[error("route {from} -> {to} references unknown place {name:?}")]
    UnknownPlace {
        from: String,
        to: String,
        name: String,
    },
    #[error("route {from} -> {to} needs distance_miles or distance_meters")]
    MissingDistance { from: String, to: String },
    #[error("route {from} -> {to} has a negative or non-finite distance")]
    InvalidDistance { from: String, to: String },
}

/// Static gazetteer plus directed route table.
#[derive(Debug, Clone, Default)]
pub struct FixtureAtlas {
    places: BTreeMap<String, Coordinate>,
    routes: Vec<(Coordinate, Coordinate, RouteLeg)>,
}

fn place_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl FixtureAtlas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_place(mut self, name: &str, coordinate: Coordinate) -> Self {
        self.places.insert(place_key(name), coordinate);
        self
    }

    /// Add a route between two known places. An empty geometry becomes the
    /// straight segment between them.
    #[must_use]
    pub fn with_route(mut self, from: Coordinate, to: Coordinate, mut leg: RouteLeg) -> Self {
        if leg.geometry.is_empty() {
            leg.geometry = vec![from, to];
        }
        self.routes.push((from, to, leg));
        self
    }

    /// Straight-line atlas over `stops`, each consecutive pair joined by a
    /// leg of the given mileage.
    #[must_use]
    pub fn straight_line(stops: &[(&str, Coordinate)], miles: &[f64]) -> Self {
        let mut atlas = stops
            .iter()
            .fold(Self::new(), |atlas, &(name, coordinate)| {
                atlas.with_place(name, coordinate)
            });
        for (pair, &distance) in stops.windows(2).zip(miles) {
            let (from, to) = (pair[0].1, pair[1].1);
            atlas = atlas.with_route(from, to, RouteLeg::new(distance, vec![from, to]));
        }
        atlas
    }

    pub fn from_fixture(fixture: &TripFixture) -> Result<Self, AtlasError> {
        let mut atlas = fixture
            .places
            .iter()
            .fold(Self::new(), |atlas, (name, &coordinate)| {
                atlas.with_place(name, coordinate)
            });

        for route in &fixture.routes {
            let locate = |name: &str| {
                atlas
                    .places
                    .get(&place_key(name))
                    .copied()
                    .ok_or_else(|| AtlasError::UnknownPlace {
                        from: route.from.clone(),
                        to: route.to.clone(),
                        name: name.to_string(),
                    })
            };
            let from = locate(&route.from)?;
            let to = locate(&route.to)?;

            let leg = match (route.distance_miles, route.distance_meters) {
                (Some(miles), _) => RouteLeg::new(miles, route.geometry.clone()),
                (None, Some(meters)) => RouteLeg::from_meters(meters, route.geometry.clone()),
                (None, None) => {
                    return Err(AtlasError::MissingDistance {
                        from: route.from.clone(),
                        to: route.to.clone(),
                    });
                }
            };
            if !leg.distance_miles.is_finite() || leg.distance_miles < 0.0 {
                return Err(AtlasError::InvalidDistance {
                    from: route.from.clone(),
                    to: route.to.clone(),
                });
            }
            atlas = atlas.with_route(from, to, leg);
        }
        Ok(atlas)
    }

    pub fn place_count(&self) -> usize {
        self.places.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

impl LocationResolver for FixtureAtlas {
    type Error = Infallible;

    fn resolve_location(&self, name: &str) -> Result<Option<Coordinate>, Self::Error> {
        Ok(self.places.get(&place_key(name)).copied())
    }
}

impl RouteProvider for FixtureAtlas {
    type Error = Infallible;

    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<RouteLeg>, Self::Error> {
        Ok(self
            .routes
            .iter()
            .find(|(from, to, _)| *from == origin && *to == destination)
            .map(|(_, _, leg)| leg.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(json: &str) -> TripFixture {
        serde_json::from_str(json).expect("fixture parses")
    }

    #[test]
    fn resolves_names_case_insensitively() {
        let atlas = FixtureAtlas::new().with_place("Tulsa, OK", Coordinate::new(-95.99, 36.15));
        assert_eq!(
            atlas.resolve_location("  tulsa, ok ").unwrap(),
            Some(Coordinate::new(-95.99, 36.15))
        );
        assert_eq!(atlas.resolve_location("Wichita, KS").unwrap(), None);
    }

    #[test]
    fn meters_are_converted_and_geometry_defaults_to_segment() {
        let fixture = fixture(
            r#"{
                "current": "A", "pickup": "B", "dropoff": "B",
                "places": {"A": [0.0, 0.0], "B": [1.0, 1.0]},
                "routes": [{"from": "A", "to": "B", "distance_meters": 160934.4}]
            }"#,
        );
        let atlas = FixtureAtlas::from_fixture(&fixture).expect("atlas builds");
        let leg = atlas
            .fetch_route(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0))
            .unwrap()
            .expect("route present");
        assert!((leg.distance_miles - 100.0).abs() < 1e-3);
        assert_eq!(leg.geometry.len(), 2);
        assert_eq!(
            atlas
                .fetch_route(Coordinate::new(1.0, 1.0), Coordinate::new(0.0, 0.0))
                .unwrap(),
            None
        );
        assert_eq!(fixture.request().cycle_hours_used, 0.0);
    }

    #[test]
    fn route_to_unknown_place_is_rejected() {
        let fixture = fixture(
            r#"{
                "current": "A", "pickup": "B", "dropoff": "C",
                "places": {"A": [0.0, 0.0]},
                "routes": [{"from": "A", "to": "B", "distance_miles": 10}]
            }"#,
        );
        assert_eq!(
            FixtureAtlas::from_fixture(&fixture).unwrap_err(),
            AtlasError::UnknownPlace {
                from: "A".to_string(),
                to: "B".to_string(),
                name: "B".to_string(),
            }
        );
    }

    #[test]
    fn route_without_distance_is_rejected() {
        let fixture = fixture(
            r#"{
                "current": "A", "pickup": "B", "dropoff": "B",
                "places": {"A": [0.0, 0.0], "B": [1.0, 0.0]},
                "routes": [{"from": "A", "to": "B"}]
            }"#,
        );
        assert!(matches!(
            FixtureAtlas::from_fixture(&fixture),
            Err(AtlasError::MissingDistance { .. })
        ));
    }

    #[test]
    fn straight_line_joins_consecutive_stops() {
        let stops = [
            ("a", Coordinate::new(0.0, 0.0)),
            ("b", Coordinate::new(1.0, 0.0)),
            ("c", Coordinate::new(2.0, 0.0)),
        ];
        let atlas = FixtureAtlas::straight_line(&stops, &[40.0, 60.0]);
        assert_eq!(atlas.place_count(), 3);
        assert_eq!(atlas.route_count(), 2);
        let leg = atlas
            .fetch_route(stops[1].1, stops[2].1)
            .unwrap()
            .expect("second leg");
        assert!((leg.distance_miles - 60.0).abs() < f64::EPSILON);
    }
}
