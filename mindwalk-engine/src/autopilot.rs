//! Autopilot — a scripted walker for headless demonstration runs.
//!
//! Starts a walk, works each presented card after a bounded random
//! pause (mostly completing, sometimes skipping), answers some emotion
//! prompts and lets others time out, then ends the walk at the deadline
//! and hands the record to the archive.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;

use mindwalk_core::archive::WalkArchive;
use mindwalk_core::geo::route_distance_m;
use mindwalk_core::models::Emotion;
use mindwalk_core::session::{SessionEvent, SessionHub};

use crate::subsystems::prompter::PromptCoordinator;

/// Odds that a presented card is completed rather than skipped.
const COMPLETE_ODDS: f64 = 0.8;
/// Odds that a shown emotion prompt gets an answer before the timeout.
const ANSWER_ODDS: f64 = 0.6;

pub struct Autopilot {
    hub: SessionHub,
    prompter: PromptCoordinator,
    archive: Option<Arc<dyn WalkArchive>>,
    duration: Duration,
    rng: StdRng,
}

impl Autopilot {
    pub fn new(
        hub: SessionHub,
        prompter: PromptCoordinator,
        archive: Option<Arc<dyn WalkArchive>>,
        duration: Duration,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            hub,
            prompter,
            archive,
            duration,
            rng,
        }
    }

    /// Drive one full walk. Returns when the walk has ended and the
    /// record is saved (or shutdown arrived first).
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut events = self.hub.subscribe();
        let walk_id = self.hub.start_walk().await;
        tracing::info!(%walk_id, "Autopilot walk started");

        let deadline = tokio::time::sleep(self.duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                _ = shutdown.recv() => break,
                event = events.recv() => match event {
                    Ok(SessionEvent::CardPresented { card }) => {
                        // Read the card for a bit before acting on it.
                        let pause = self.rng.gen_range(500..3000);
                        tokio::time::sleep(Duration::from_millis(pause)).await;

                        if self.rng.gen_bool(COMPLETE_ODDS) {
                            self.hub.complete_card(card.id).await;
                            self.maybe_answer_prompt().await;
                        } else {
                            self.hub.skip_card(card.id).await;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Autopilot lagged {} session events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        self.finish().await;
    }

    async fn maybe_answer_prompt(&mut self) {
        // The prompter opens the selector on the completion event; give
        // it a beat to do so.
        tokio::task::yield_now().await;
        if !self.prompter.is_visible() {
            return;
        }
        if !self.rng.gen_bool(ANSWER_ODDS) {
            // Let the countdown expire; no mark gets recorded.
            return;
        }
        let pause = self.rng.gen_range(300..2000);
        tokio::time::sleep(Duration::from_millis(pause)).await;
        let emotion = Emotion::ALL[self.rng.gen_range(0..Emotion::ALL.len())];
        self.hub.add_emotion_mark(emotion).await;
    }

    async fn finish(&mut self) {
        let Some(record) = self.hub.end_walk().await else {
            return;
        };
        tracing::info!(
            walk_id = %record.walk_id,
            route_points = record.route.len(),
            distance_m = route_distance_m(&record.route),
            emotion_marks = record.emotion_marks.len(),
            cards_completed = record.cards_completed,
            "Walk finished"
        );

        if let Some(archive) = &self.archive {
            match archive.save_walk(&record).await {
                Ok(()) => tracing::info!("Walk record archived"),
                Err(err) => tracing::error!("Failed to archive walk record: {}", err),
            }
        }
    }
}
