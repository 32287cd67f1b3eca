use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five fixed exploratory card categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Observation,
    Movement,
    Interaction,
    Reflection,
    Discovery,
}

impl CardKind {
    pub const ALL: [CardKind; 5] = [
        CardKind::Observation,
        CardKind::Movement,
        CardKind::Interaction,
        CardKind::Reflection,
        CardKind::Discovery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Observation => "observation",
            CardKind::Movement => "movement",
            CardKind::Interaction => "interaction",
            CardKind::Reflection => "reflection",
            CardKind::Discovery => "discovery",
        }
    }

    pub fn parse(s: &str) -> Option<CardKind> {
        match s {
            "observation" => Some(CardKind::Observation),
            "movement" => Some(CardKind::Movement),
            "interaction" => Some(CardKind::Interaction),
            "reflection" => Some(CardKind::Reflection),
            "discovery" => Some(CardKind::Discovery),
            _ => None,
        }
    }

    /// Index into per-kind tables (usage counters, catalog profiles).
    pub fn index(&self) -> usize {
        match self {
            CardKind::Observation => 0,
            CardKind::Movement => 1,
            CardKind::Interaction => 2,
            CardKind::Reflection => 3,
            CardKind::Discovery => 4,
        }
    }
}

impl std::fmt::Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exploratory prompt presented to the walker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkCard {
    pub id: Uuid,
    pub kind: CardKind,
    pub content: String,
    /// Suggested time to spend on the card, minutes. Only set for kinds
    /// where lingering makes sense.
    pub estimated_minutes: Option<u8>,
    /// True when the card came from the remote generator rather than the
    /// static catalog.
    pub generated: bool,
    pub created_at: DateTime<Utc>,
}

impl WalkCard {
    pub fn new(kind: CardKind, content: impl Into<String>, estimated_minutes: Option<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            estimated_minutes,
            generated: false,
            created_at: Utc::now(),
        }
    }
}
