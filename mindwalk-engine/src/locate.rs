//! Location source capability.
//!
//! `LocationSource::subscribe` opens a continuous stream of position
//! fixes as a `PositionWatch`. The watch owns a cancellation token:
//! stopping it (or dropping it) cancels the producer synchronously, so a
//! fix from a cancelled subscription generation can never be delivered.
//! Errors travel in-band — a failed fix does not end the stream, because
//! geolocation errors are transient and the source keeps retrying.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use mindwalk_core::config::{LocateConfig, StrollConfig};
use mindwalk_core::models::PositionSample;

/// Buffer between the producer task and the consumer of a watch.
const WATCH_CAPACITY: usize = 32;

/// Metres per degree of latitude, near enough for simulated steps.
const METERS_PER_DEG_LAT: f64 = 111_320.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Timed out waiting for a position fix")]
    Timeout,

    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

/// Subscription options, mirroring the device geolocation API.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub max_cache_age: Duration,
}

impl From<&LocateConfig> for WatchOptions {
    fn from(config: &LocateConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            timeout: Duration::from_millis(config.timeout_ms),
            max_cache_age: Duration::from_millis(config.max_cache_age_ms),
        }
    }
}

/// One live subscription generation. Dropping the watch releases the
/// producer; a leaked live GPS listener is not an option.
pub struct PositionWatch {
    rx: mpsc::Receiver<Result<PositionSample, LocateError>>,
    cancel: CancellationToken,
}

impl PositionWatch {
    pub fn new(
        rx: mpsc::Receiver<Result<PositionSample, LocateError>>,
        cancel: CancellationToken,
    ) -> Self {
        Self { rx, cancel }
    }

    /// Next fix or in-band error; `None` once the producer is gone.
    pub async fn recv(&mut self) -> Option<Result<PositionSample, LocateError>> {
        self.rx.recv().await
    }

    /// Token shared with the producer. Cancelling it stops delivery.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the subscription. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn subscribe(&self, options: WatchOptions) -> Result<PositionWatch, LocateError>;
}

// ============================================================================
// SimulatedLocationSource
// ============================================================================

/// A random stroll from a configured start point, one fix per interval.
/// Stands in for the device GPS when the engine runs headless.
pub struct SimulatedLocationSource {
    config: StrollConfig,
    seed: Option<u64>,
}

impl SimulatedLocationSource {
    pub fn new(config: StrollConfig) -> Self {
        Self { config, seed: None }
    }

    /// Seeded stroll for reproducible runs.
    pub fn seeded(config: StrollConfig, seed: u64) -> Self {
        Self {
            config,
            seed: Some(seed),
        }
    }
}

#[async_trait]
impl LocationSource for SimulatedLocationSource {
    async fn subscribe(&self, _options: WatchOptions) -> Result<PositionWatch, LocateError> {
        let (tx, rx) = mpsc::channel(WATCH_CAPACITY);
        let cancel = CancellationToken::new();
        let producer_cancel = cancel.clone();

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let interval = Duration::from_millis(self.config.interval_ms);
        let step_m = self.config.step_m;
        let mut lat = self.config.start_lat;
        let mut lng = self.config.start_lng;
        let mut heading: f64 = rng.gen_range(0.0..std::f64::consts::TAU);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = producer_cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                // Wander: drift the heading a little, step forward.
                heading += rng.gen_range(-0.5..0.5);
                lat += step_m * heading.cos() / METERS_PER_DEG_LAT;
                lng += step_m * heading.sin() / (METERS_PER_DEG_LAT * lat.to_radians().cos());

                let fix = PositionSample {
                    lat,
                    lng,
                    accuracy_m: Some(rng.gen_range(3.0..15.0)),
                    timestamp: Utc::now(),
                };
                if tx.send(Ok(fix)).await.is_err() {
                    break;
                }
            }
        });

        Ok(PositionWatch::new(rx, cancel))
    }
}
