pub mod archive;
pub mod catalog;
pub mod config;
pub mod deck;
pub mod error;
pub mod generate;
pub mod geo;
pub mod models;
pub mod session;

pub use archive::{PgWalkArchive, WalkArchive};
pub use config::MindwalkConfig;
pub use error::MindwalkError;
pub use generate::{
    CardRequest, CardSource, CardSourceError, CatalogCardSource, FallbackCardSource,
    GeneratorConfig, RemoteCardClient, TimeOfDay, create_card_source,
};
pub use geo::{haversine_distance_m, route_distance_m, GeoPoint, EARTH_RADIUS_M};
pub use session::{SessionEvent, SessionHub, WalkSession};
