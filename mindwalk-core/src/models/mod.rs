pub mod card;
pub mod emotion;
pub mod profile;
pub mod route;
pub mod walk;

pub use card::{CardKind, WalkCard};
pub use emotion::{Emotion, EmotionMark};
pub use profile::{MapStyle, Preferences, WalkerProfile};
pub use route::{PositionSample, RoutePoint};
pub use walk::{WalkRecord, WalkStatus, WalkSummary};
