use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::emotion::EmotionMark;
use super::route::RoutePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkStatus {
    NotStarted,
    Active,
    Ended,
}

/// The snapshot handed to the archive when a walk ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkRecord {
    pub walk_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub route: Vec<RoutePoint>,
    pub emotion_marks: Vec<EmotionMark>,
    pub cards_completed: u32,
}

/// One row of the archive listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkSummary {
    pub walk_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub route_points: usize,
    pub emotion_marks: usize,
    pub cards_completed: u32,
}
