//! Map projector — derives the map display from session events.
//!
//! The projector maintains exactly one route polyline (re-pathed in
//! place, never recreated, which would flicker), exactly one user
//! marker (moved, never recreated), and one marker per emotion mark,
//! reconciled by mark id. Recentering follows the walker while the
//! session is active but is gated on a minimum haversine distance from
//! the last recenter point so GPS noise while standing still does not
//! jitter the view.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::broadcast;
use uuid::Uuid;

use mindwalk_core::config::MapConfig;
use mindwalk_core::geo::{haversine_distance_m, GeoPoint};
use mindwalk_core::models::EmotionMark;
use mindwalk_core::session::SessionEvent;

use crate::map::{
    MapSurface, MarkerIcon, MarkerId, MarkerSpec, PolylineId, PolylineSpec, EMOTION_MARKER_Z,
    ROUTE_STROKE, USER_MARKER_Z,
};

pub struct MapProjector {
    map: Box<dyn MapSurface>,
    recenter_threshold_m: f64,
    pan_duration: Duration,

    following: bool,
    route: Vec<GeoPoint>,
    user_marker: Option<MarkerId>,
    polyline: Option<PolylineId>,
    mark_markers: HashMap<Uuid, MarkerId>,
    last_recenter: Option<GeoPoint>,
}

impl MapProjector {
    pub fn new(map: Box<dyn MapSurface>, config: &MapConfig) -> Self {
        Self {
            map,
            recenter_threshold_m: config.recenter_threshold_m,
            pan_duration: Duration::from_millis(config.pan_duration_ms),
            following: false,
            route: Vec::new(),
            user_marker: None,
            polyline: None,
            mark_markers: HashMap::new(),
            last_recenter: None,
        }
    }

    /// Apply one session event to the map.
    pub fn handle(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::WalkStarted { .. } => self.reset_for_new_walk(),
            SessionEvent::WalkEnded { .. } => {
                // Positions may keep arriving; the view stops chasing them.
                self.following = false;
            }
            SessionEvent::FixApplied { fix, appended } => {
                let position = GeoPoint::from(fix);
                self.project_user(position);
                if *appended {
                    self.route.push(position);
                    self.project_route();
                }
                self.maybe_recenter(position);
            }
            SessionEvent::EmotionMarked { mark } => self.project_mark(mark),
            SessionEvent::CardPresented { .. }
            | SessionEvent::CardCompleted { .. }
            | SessionEvent::CardSkipped { .. } => {}
        }
    }

    fn reset_for_new_walk(&mut self) {
        self.following = true;
        self.route.clear();
        self.last_recenter = None;
        if let Some(id) = self.polyline.take() {
            self.map.remove_polyline(id);
        }
        // Marks are append-only within a walk; a new walk is the one
        // moment the whole set goes away.
        for (_, id) in self.mark_markers.drain() {
            self.map.remove_marker(id);
        }
    }

    fn project_user(&mut self, position: GeoPoint) {
        match self.user_marker {
            Some(id) => self.map.move_marker(id, position),
            None => {
                let id = self.map.add_marker(MarkerSpec {
                    position,
                    icon: MarkerIcon::UserDot,
                    z_index: USER_MARKER_Z,
                });
                self.user_marker = Some(id);
            }
        }
    }

    fn project_route(&mut self) {
        // A polyline needs two vertices; created once, re-pathed after.
        if self.route.len() < 2 {
            return;
        }
        match self.polyline {
            Some(id) => self.map.set_polyline_path(id, self.route.clone()),
            None => {
                let id = self.map.add_polyline(PolylineSpec {
                    path: self.route.clone(),
                    stroke: ROUTE_STROKE,
                });
                self.polyline = Some(id);
            }
        }
    }

    fn project_mark(&mut self, mark: &EmotionMark) {
        if self.mark_markers.contains_key(&mark.id) {
            return;
        }
        let id = self.map.add_marker(MarkerSpec {
            position: GeoPoint::new(mark.lat, mark.lng),
            icon: MarkerIcon::Emotion(mark.emotion),
            z_index: EMOTION_MARKER_Z,
        });
        self.mark_markers.insert(mark.id, id);
    }

    fn maybe_recenter(&mut self, position: GeoPoint) {
        if !self.following {
            return;
        }
        if let Some(last) = self.last_recenter {
            if haversine_distance_m(last, position) < self.recenter_threshold_m {
                return;
            }
        }
        self.map.pan_to(position, self.pan_duration);
        self.last_recenter = Some(position);
    }
}

/// Subsystem loop: render every session event until shutdown.
pub async fn run_projector(
    mut projector: MapProjector,
    mut events: broadcast::Receiver<SessionEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => projector.handle(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Projector lagged {} session events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}
