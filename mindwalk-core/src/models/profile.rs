use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::CardKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStyle {
    Minimal,
    Satellite,
}

/// Tunable walker preferences. Preferred kinds bias catalog selection;
/// an empty list means no bias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub preferred_kinds: Vec<CardKind>,
    pub auto_emotion_prompt: bool,
    pub map_style: MapStyle,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_kinds: Vec::new(),
            auto_emotion_prompt: true,
            map_style: MapStyle::Minimal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerProfile {
    pub walker_id: Uuid,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
    pub preferences: Preferences,
}

impl WalkerProfile {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            walker_id: Uuid::new_v4(),
            device_id: device_id.into(),
            created_at: Utc::now(),
            preferences: Preferences::default(),
        }
    }
}
