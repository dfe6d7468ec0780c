//! Planar coordinates and position interpolation along route polylines.
//!
//! Distances here are plain Euclidean distances in degree space. They are only
//! used to place events proportionally along a leg, never to measure miles.
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(longitude, latitude)` pair, serialized as a GeoJSON position `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Euclidean distance to `other` in coordinate units.
    #[must_use]
    pub fn planar_distance(self, other: Self) -> f64 {
        (other.lon - self.lon).hypot(other.lat - self.lat)
    }

    /// Point `t` of the way from `self` to `other`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            lon: self.lon + (other.lon - self.lon) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.lon, value.lat]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lon, self.lat)
    }
}

/// Point located `fraction` of the way along the polyline's total length.
///
/// Returns `None` only for an empty polyline. A single point, or a polyline
/// whose points all coincide, yields its first point; floating error that
/// walks past the final segment yields the last point.
#[must_use]
pub fn interpolate_along(points: &[Coordinate], fraction: f64) -> Option<Coordinate> {
    let first = *points.first()?;
    if points.len() == 1 {
        return Some(first);
    }

    if fraction.is_nan() || fraction <= 0.0 {
        return Some(first);
    }
    if fraction >= 1.0 {
        return points.last().copied();
    }

    let segment_lengths: Vec<f64> = points
        .windows(2)
        .map(|pair| pair[0].planar_distance(pair[1]))
        .collect();
    let total_length: f64 = segment_lengths.iter().sum();
    if total_length <= 0.0 {
        return Some(first);
    }

    let target = fraction * total_length;
    let mut walked = 0.0;
    for (idx, &length) in segment_lengths.iter().enumerate() {
        if walked + length >= target {
            let t = if length > 0.0 {
                (target - walked) / length
            } else {
                0.0
            };
            return Some(points[idx].lerp(points[idx + 1], t));
        }
        walked += length;
    }

    points.last().copied()
}
