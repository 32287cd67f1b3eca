use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One geolocation fix as delivered by a location source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// One accepted fix on an active walk's route. Append-only; the timestamp
/// is carried over from the fix, not re-stamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&PositionSample> for RoutePoint {
    fn from(fix: &PositionSample) -> Self {
        Self {
            lat: fix.lat,
            lng: fix.lng,
            timestamp: fix.timestamp,
        }
    }
}
