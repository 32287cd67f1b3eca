//! Static card catalog — per-kind prompt tables and presentation metadata.

use crate::models::CardKind;

/// Everything fixed about one card kind: whether completing one of its
/// cards can be tagged with an emotion, the emblem shown on the card, and
/// the prompt table draws come from.
#[derive(Debug, Clone, Copy)]
pub struct KindProfile {
    pub kind: CardKind,
    pub markable: bool,
    pub emblem: &'static str,
    pub prompts: &'static [&'static str],
}

const OBSERVATION_PROMPTS: &[&str] = &[
    "Look for the next colour that leaves an impression on you",
    "Notice the first sound you hear from here",
    "Study the most unusual texture or material around you",
    "Find an object that makes you curious",
    "Watch the shadows the sunlight throws onto the buildings",
    "Spot a detail you have never noticed before",
    "Observe the walking rhythm of the people passing by",
    "Look for an interesting reflective surface",
    "Notice how the plants around you are doing",
    "Watch the clouds change shape",
];

const MOVEMENT_PROMPTS: &[&str] = &[
    "Walk to your left for three minutes",
    "Follow the first person ahead of you for a short stretch",
    "Choose the path that looks least remarkable",
    "Change your walking pace, slow down or speed up",
    "Walk to the nearest crossing and turn right",
    "Find the tallest building and walk toward it",
    "Follow the first curved path you can see",
    "Head toward the trees",
    "Pick an entrance or exit you have never used",
    "Walk toward where you hear the most sound",
];

const INTERACTION_PROMPTS: &[&str] = &[
    "Watch a stranger for thirty seconds and imagine their story",
    "Touch the next interesting surface you pass",
    "Smile at someone walking by",
    "Give a nearby building a nickname in your head",
    "Mirror the posture of someone you can see",
    "Feel the texture of a wall, a railing, or a tree trunk",
    "Imagine what this place looked like a hundred years ago",
    "Think of a new use for the shop you just passed",
    "Pretend you are seeing this place for the first time",
    "Greet the first animal, or statue, you come across",
];

const REFLECTION_PROMPTS: &[&str] = &[
    "Find a spot to stand still and listen for a minute with your eyes closed",
    "Recall your first impression of this street",
    "Notice how your body feels right now",
    "Take three deep breaths and taste the air",
    "Remember the last time you were here",
    "Imagine what it would feel like to live here",
    "Stand still for thirty seconds and feel the ground under your feet",
    "Think about what makes this place comfortable for you",
    "Close your eyes and pick out at least three different sounds",
    "Notice your mood right now and accept it without judging it",
];

const DISCOVERY_PROMPTS: &[&str] = &[
    "Look for a small path you have never taken",
    "Head toward the building that draws you most",
    "Explore an overlooked corner",
    "Look for a hidden little space",
    "Find an interesting door or window",
    "Find a high point with a view into the distance",
    "Explore the nearest park or patch of green",
    "Look for a wall with a story",
    "Find a unique angle worth photographing",
    "Find a place where you can hear water",
];

pub const PROFILES: [KindProfile; 5] = [
    KindProfile {
        kind: CardKind::Observation,
        markable: true,
        emblem: "👁️",
        prompts: OBSERVATION_PROMPTS,
    },
    KindProfile {
        kind: CardKind::Movement,
        markable: false,
        emblem: "🚶",
        prompts: MOVEMENT_PROMPTS,
    },
    KindProfile {
        kind: CardKind::Interaction,
        markable: true,
        emblem: "🤝",
        prompts: INTERACTION_PROMPTS,
    },
    KindProfile {
        kind: CardKind::Reflection,
        markable: true,
        emblem: "🧘",
        prompts: REFLECTION_PROMPTS,
    },
    KindProfile {
        kind: CardKind::Discovery,
        markable: false,
        emblem: "🔍",
        prompts: DISCOVERY_PROMPTS,
    },
];

pub fn profile(kind: CardKind) -> &'static KindProfile {
    &PROFILES[kind.index()]
}

/// The prompt table for a kind.
pub fn examples_for(kind: CardKind) -> &'static [&'static str] {
    profile(kind).prompts
}

/// Whether completing a card of this kind opens the emotion prompt.
pub fn is_markable(kind: CardKind) -> bool {
    profile(kind).markable
}
