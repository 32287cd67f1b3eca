//! Map surface capability.
//!
//! The projector never talks to a vendor map SDK. It depends on
//! `MapSurface` — create, move, and destroy overlays, pan the view — so
//! the shipped `TraceMap` and the recording fake used in tests are
//! interchangeable. The surface is a passive display: fixed zoom, no
//! gestures, all motion programmatic.

use std::time::Duration;

use thiserror::Error;

use mindwalk_core::config::MapConfig;
use mindwalk_core::geo::GeoPoint;
use mindwalk_core::models::Emotion;

/// Stroke style of the route polyline.
pub const ROUTE_STROKE: StrokeStyle = StrokeStyle {
    color: "#1890ff",
    weight: 4,
    opacity: 0.8,
};

/// Z-order for the walker's own position marker.
pub const USER_MARKER_Z: i32 = 1000;
/// Z-order for emotion-mark markers, below the walker.
pub const EMOTION_MARKER_Z: i32 = 500;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("No map API key configured (set map.api_key or MINDWALK_MAP_KEY)")]
    MissingApiKey,

    #[error("Map failed to open: {0}")]
    OpenFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolylineId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIcon {
    /// The walker's current position.
    UserDot,
    /// An emotion tagged on the route.
    Emotion(Emotion),
}

#[derive(Debug, Clone)]
pub struct MarkerSpec {
    pub position: GeoPoint,
    pub icon: MarkerIcon,
    pub z_index: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: &'static str,
    pub weight: u8,
    pub opacity: f64,
}

#[derive(Debug, Clone)]
pub struct PolylineSpec {
    pub path: Vec<GeoPoint>,
    pub stroke: StrokeStyle,
}

/// Narrow overlay surface the projector renders onto.
pub trait MapSurface: Send {
    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId;
    fn move_marker(&mut self, id: MarkerId, to: GeoPoint);
    fn remove_marker(&mut self, id: MarkerId);
    fn add_polyline(&mut self, spec: PolylineSpec) -> PolylineId;
    /// Replace the vertex sequence of an existing polyline in place.
    fn set_polyline_path(&mut self, id: PolylineId, path: Vec<GeoPoint>);
    fn remove_polyline(&mut self, id: PolylineId);
    /// Instant jump, no animation.
    fn set_center(&mut self, center: GeoPoint);
    /// Animated recenter over `duration`.
    fn pan_to(&mut self, center: GeoPoint, duration: Duration);
}

/// Open the map surface, or report why the engine must run without one.
/// A missing API key is the common degraded path: the walk still tracks,
/// nothing renders.
pub fn open_map(config: &MapConfig) -> Result<Box<dyn MapSurface>, MapError> {
    let Some(key) = config.resolved_api_key() else {
        return Err(MapError::MissingApiKey);
    };
    tracing::info!(
        zoom = config.zoom,
        center_lat = config.center_lat,
        center_lng = config.center_lng,
        "Map opened (key ...{})",
        key_suffix(&key)
    );
    let mut map = TraceMap::default();
    map.set_center(GeoPoint::new(config.center_lat, config.center_lng));
    Ok(Box::new(map))
}

/// Last four characters of the key, safe on any char boundary.
fn key_suffix(key: &str) -> String {
    let mut tail: Vec<char> = key.chars().rev().take(4).collect();
    tail.reverse();
    tail.into_iter().collect()
}

// ============================================================================
// TraceMap
// ============================================================================

/// The shipped surface: renders by logging. Every overlay operation is a
/// `tracing` event, which is what a headless engine has for a screen.
#[derive(Debug, Default)]
pub struct TraceMap {
    next_id: u64,
}

impl TraceMap {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MapSurface for TraceMap {
    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next());
        let icon = match spec.icon {
            MarkerIcon::UserDot => "user".to_string(),
            MarkerIcon::Emotion(e) => format!("emotion:{}", e),
        };
        tracing::debug!(
            marker = id.0,
            icon = %icon,
            lat = spec.position.lat,
            lng = spec.position.lng,
            "map: add marker"
        );
        id
    }

    fn move_marker(&mut self, id: MarkerId, to: GeoPoint) {
        tracing::trace!(marker = id.0, lat = to.lat, lng = to.lng, "map: move marker");
    }

    fn remove_marker(&mut self, id: MarkerId) {
        tracing::debug!(marker = id.0, "map: remove marker");
    }

    fn add_polyline(&mut self, spec: PolylineSpec) -> PolylineId {
        let id = PolylineId(self.next());
        tracing::debug!(polyline = id.0, vertices = spec.path.len(), "map: add polyline");
        id
    }

    fn set_polyline_path(&mut self, id: PolylineId, path: Vec<GeoPoint>) {
        tracing::trace!(polyline = id.0, vertices = path.len(), "map: set polyline path");
    }

    fn remove_polyline(&mut self, id: PolylineId) {
        tracing::debug!(polyline = id.0, "map: remove polyline");
    }

    fn set_center(&mut self, center: GeoPoint) {
        tracing::trace!(lat = center.lat, lng = center.lng, "map: set center");
    }

    fn pan_to(&mut self, center: GeoPoint, duration: Duration) {
        tracing::trace!(
            lat = center.lat,
            lng = center.lng,
            duration_ms = duration.as_millis() as u64,
            "map: pan"
        );
    }
}
