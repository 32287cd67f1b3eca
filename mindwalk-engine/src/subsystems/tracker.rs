//! Geo sampler — forwards fixes from the location source to the hub.
//!
//! One subscription generation per walk. `stop_tracking` cancels the
//! generation's token synchronously, so a fix that arrives after the
//! stop is dropped, never applied to the session. Errors from the source
//! are recorded as `last_error` and the subscription keeps going; the
//! platform retries on its own.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mindwalk_core::session::{SessionEvent, SessionHub};

use crate::locate::{LocateError, LocationSource, WatchOptions};

struct Generation {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct Tracker {
    hub: SessionHub,
    source: Arc<dyn LocationSource>,
    options: WatchOptions,
    last_error: Arc<Mutex<Option<LocateError>>>,
    current: Option<Generation>,
}

impl Tracker {
    pub fn new(hub: SessionHub, source: Arc<dyn LocationSource>, options: WatchOptions) -> Self {
        Self {
            hub,
            source,
            options,
            last_error: Arc::new(Mutex::new(None)),
            current: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.current.is_some()
    }

    /// Most recent geolocation failure, if any. Transient by contract.
    pub fn last_error(&self) -> Option<LocateError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Open a subscription and forward every fix to the hub in delivery
    /// order. A no-op while already tracking.
    pub async fn start_tracking(&mut self) -> Result<(), LocateError> {
        if self.current.is_some() {
            return Ok(());
        }

        let mut watch = self.source.subscribe(self.options).await?;
        let cancel = watch.cancel_token();
        let task_cancel = cancel.clone();
        let hub = self.hub.clone();
        let last_error = self.last_error.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    item = watch.recv() => match item {
                        Some(Ok(fix)) => {
                            // A fix pulled off the buffer in the same poll
                            // as the cancel must still be dropped.
                            if task_cancel.is_cancelled() {
                                break;
                            }
                            hub.update_location(fix).await;
                        }
                        Some(Err(err)) => {
                            tracing::warn!("Geolocation error (subscription continues): {}", err);
                            *last_error.lock().unwrap_or_else(PoisonError::into_inner) =
                                Some(err);
                        }
                        None => break,
                    }
                }
            }
        });

        self.current = Some(Generation { cancel, task });
        tracing::info!("Location tracking started");
        Ok(())
    }

    /// Cancel the live subscription generation. Idempotent; the cancel
    /// lands before this returns, so no later fix reaches the hub.
    pub fn stop_tracking(&mut self) {
        if let Some(generation) = self.current.take() {
            generation.cancel.cancel();
            generation.task.abort();
            tracing::info!("Location tracking stopped");
        }
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.stop_tracking();
    }
}

/// Subsystem loop: track while a walk is active. The events receiver is
/// taken by value so callers subscribe before spawning and cannot miss
/// the first `WalkStarted`.
pub async fn run_tracker(
    mut tracker: Tracker,
    mut events: broadcast::Receiver<SessionEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SessionEvent::WalkStarted { .. }) => {
                    if let Err(err) = tracker.start_tracking().await {
                        tracing::warn!("Could not start location tracking: {}", err);
                    }
                }
                Ok(SessionEvent::WalkEnded { .. }) => tracker.stop_tracking(),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Tracker lagged {} session events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
    tracker.stop_tracking();
}
