//! Mindwalk runtime: capability seams (map surface, location source)
//! and the subsystems that observe the session hub — tracker, projector,
//! prompter, dealer — plus the autopilot that drives demonstration
//! walks.

pub mod autopilot;
pub mod locate;
pub mod map;
pub mod subsystems;

pub use autopilot::Autopilot;
pub use locate::{LocateError, LocationSource, PositionWatch, SimulatedLocationSource, WatchOptions};
pub use map::{open_map, MapError, MapSurface, MarkerIcon, MarkerSpec, PolylineSpec, TraceMap};
pub use subsystems::dealer::Dealer;
pub use subsystems::projector::MapProjector;
pub use subsystems::prompter::{HideReason, PromptCoordinator, PromptEvent};
pub use subsystems::tracker::Tracker;
