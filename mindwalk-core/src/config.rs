use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::models::{CardKind, MapStyle, Preferences, WalkerProfile};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MindwalkConfig {
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub locate: LocateConfig,
    #[serde(default)]
    pub stroll: StrollConfig,
    #[serde(default)]
    pub cards: CardsConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    /// No `[archive]` section means the engine runs without persistence.
    #[serde(default)]
    pub archive: Option<ArchiveConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    pub api_key: Option<String>,
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
    pub recenter_threshold_m: f64,
    pub pan_duration_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            center_lat: 39.90923,
            center_lng: 116.397428,
            zoom: 16,
            recenter_threshold_m: 5.0,
            pan_duration_ms: 500,
        }
    }
}

impl MapConfig {
    /// Config key first, then the MINDWALK_MAP_KEY environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("MINDWALK_MAP_KEY").ok())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocateConfig {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    pub max_cache_age_ms: u64,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10_000,
            max_cache_age_ms: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StrollConfig {
    pub start_lat: f64,
    pub start_lng: f64,
    pub interval_ms: u64,
    pub step_m: f64,
}

impl Default for StrollConfig {
    fn default() -> Self {
        Self {
            start_lat: 39.90923,
            start_lng: 116.397428,
            interval_ms: 1000,
            step_m: 3.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CardsConfig {
    pub generator_url: Option<String>,
    pub api_key: Option<String>,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub think_delay_ms: u64,
    pub next_card_delay_ms: u64,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            generator_url: None,
            api_key: None,
            max_retries: 3,
            retry_delay_ms: 500,
            think_delay_ms: 500,
            next_card_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    pub auto_hide_ms: u64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { auto_hide_ms: 8000 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfileConfig {
    pub device_id: String,
    pub preferred_kinds: Vec<CardKind>,
    pub auto_emotion_prompt: bool,
    pub map_style: MapStyle,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            device_id: "mindwalk-engine".to_string(),
            preferred_kinds: Vec::new(),
            auto_emotion_prompt: true,
            map_style: MapStyle::Minimal,
        }
    }
}

impl ProfileConfig {
    pub fn to_profile(&self) -> WalkerProfile {
        let mut profile = WalkerProfile::new(self.device_id.clone());
        profile.preferences = Preferences {
            preferred_kinds: self.preferred_kinds.clone(),
            auto_emotion_prompt: self.auto_emotion_prompt,
            map_style: self.map_style,
        };
        profile
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    pub url: String,
    pub max_connections: u32,
}

impl MindwalkConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}
