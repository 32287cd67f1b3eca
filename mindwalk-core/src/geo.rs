//! Spherical-earth geometry for recenter gating and route summaries.

use serde::{Deserialize, Serialize};

use crate::models::{PositionSample, RoutePoint};

/// Mean earth radius, meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<&PositionSample> for GeoPoint {
    fn from(fix: &PositionSample) -> Self {
        Self {
            lat: fix.lat,
            lng: fix.lng,
        }
    }
}

impl From<&RoutePoint> for GeoPoint {
    fn from(point: &RoutePoint) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
        }
    }
}

/// Great-circle distance between two points, meters (haversine).
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Total length of a route, meters. Zero for fewer than two points.
pub fn route_distance_m(points: &[RoutePoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance_m(GeoPoint::from(&pair[0]), GeoPoint::from(&pair[1])))
        .sum()
}
