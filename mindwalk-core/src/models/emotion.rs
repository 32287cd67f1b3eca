use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::CardKind;

/// The affective reactions a walker can tag at a point on the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Joy,
    Surprise,
    Confusion,
    Calm,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Joy,
        Emotion::Surprise,
        Emotion::Confusion,
        Emotion::Calm,
        Emotion::Neutral,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            Emotion::Joy => "😊",
            Emotion::Surprise => "😮",
            Emotion::Confusion => "🤔",
            Emotion::Calm => "😌",
            Emotion::Neutral => "😐",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Joy => "Joyful",
            Emotion::Surprise => "Surprised",
            Emotion::Confusion => "Puzzled",
            Emotion::Calm => "Calm",
            Emotion::Neutral => "Neutral",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Surprise => "surprise",
            Emotion::Confusion => "confusion",
            Emotion::Calm => "calm",
            Emotion::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An emotion tagged at a location, stamped with the card that was active
/// at tagging time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionMark {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub emotion: Emotion,
    pub marked_at: DateTime<Utc>,
    pub card_kind: CardKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_emotion_has_emoji_and_label() {
        for emotion in Emotion::ALL {
            assert!(!emotion.emoji().is_empty());
            assert!(!emotion.label().is_empty());
        }
    }

    #[test]
    fn test_emotion_serde_uses_snake_case() {
        let json = serde_json::to_string(&Emotion::Surprise).unwrap();
        assert_eq!(json, "\"surprise\"");
    }

    #[test]
    fn test_mark_serializes_card_kind() {
        let mark = EmotionMark {
            id: Uuid::new_v4(),
            lat: 39.9,
            lng: 116.4,
            emotion: Emotion::Calm,
            marked_at: Utc::now(),
            card_kind: CardKind::Reflection,
        };
        let value = serde_json::to_value(&mark).unwrap();
        assert_eq!(value["emotion"], "calm");
        assert_eq!(value["card_kind"], "reflection");
    }
}
