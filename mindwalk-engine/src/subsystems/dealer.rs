//! Card dealer — keeps the walker holding a card.
//!
//! Listens to session events: a walk start, a completion, or a skip each
//! leads to the next draw after the configured pauses (a short "think"
//! delay before every card, plus a breather after a completion). The
//! draw builds its request context from the hub — latest position, time
//! of day, kinds already used, contents to steer away from — and goes to
//! whatever `CardSource` is configured; a draw that lands after the walk
//! ended is refused by the hub and dropped here.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use uuid::Uuid;

use mindwalk_core::archive::WalkArchive;
use mindwalk_core::config::CardsConfig;
use mindwalk_core::generate::{CardRequest, CardSource, TimeOfDay};
use mindwalk_core::geo::GeoPoint;
use mindwalk_core::models::WalkCard;
use mindwalk_core::session::{SessionEvent, SessionHub};

pub struct Dealer {
    hub: SessionHub,
    source: Arc<dyn CardSource>,
    archive: Option<Arc<dyn WalkArchive>>,
    think_delay: Duration,
    next_card_delay: Duration,
}

impl Dealer {
    pub fn new(
        hub: SessionHub,
        source: Arc<dyn CardSource>,
        archive: Option<Arc<dyn WalkArchive>>,
        config: &CardsConfig,
    ) -> Self {
        Self {
            hub,
            source,
            archive,
            think_delay: Duration::from_millis(config.think_delay_ms),
            next_card_delay: Duration::from_millis(config.next_card_delay_ms),
        }
    }

    async fn build_request(&self) -> CardRequest {
        let history = self.hub.card_history().await;
        let mut recent_contents: Vec<String> =
            history.iter().map(|card| card.content.clone()).collect();
        if let Some(current) = self.hub.current_card().await {
            recent_contents.push(current.content);
        }
        CardRequest {
            location: self.hub.latest_fix().await.map(|fix| GeoPoint::from(&fix)),
            time_of_day: TimeOfDay::current(),
            kinds_used: history.iter().map(|card| card.kind).collect(),
            recent_contents,
        }
    }

    /// Draw and present the next card. The deal is keyed to the walk it
    /// was triggered under: if the walk ended or was restarted while we
    /// were thinking, the draw is dropped rather than landing as the new
    /// walk's first card.
    async fn deal(&self, walk_id: Uuid) {
        if self.hub.walk_id().await != Some(walk_id) {
            tracing::debug!("Pending draw dropped; its walk was superseded");
            return;
        }
        let request = self.build_request().await;
        let card = match self.source.draw(&request).await {
            Ok(card) => card,
            Err(err) => {
                tracing::warn!(source = self.source.name(), "Card draw failed: {}", err);
                return;
            }
        };
        if self.hub.walk_id().await != Some(walk_id) {
            tracing::debug!("Drawn card dropped; its walk was superseded");
            return;
        }
        tracing::info!(
            kind = %card.kind,
            generated = card.generated,
            "Next card: {}",
            card.content
        );
        if !self.hub.present_card(card).await {
            tracing::debug!("Drawn card refused; walk no longer active");
        }
    }

    async fn archive_completed(&self, walk_id: Uuid, card: &WalkCard) {
        let Some(archive) = &self.archive else {
            return;
        };
        if let Err(err) = archive.save_card(walk_id, card).await {
            tracing::warn!("Failed to archive completed card: {}", err);
        }
    }
}

/// Subsystem loop: deal in response to walk starts, completions, skips.
/// Events arrive in emit order, so `current_walk` is exactly the walk
/// that was active when each card event fired; deals triggered under a
/// walk that has since ended or restarted die in `deal`.
pub async fn run_dealer(
    dealer: Dealer,
    mut events: broadcast::Receiver<SessionEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut current_walk: Option<Uuid> = None;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SessionEvent::WalkStarted { walk_id }) => {
                    current_walk = Some(walk_id);
                    tokio::time::sleep(dealer.think_delay).await;
                    dealer.deal(walk_id).await;
                }
                Ok(SessionEvent::WalkEnded { .. }) => {
                    current_walk = None;
                }
                Ok(SessionEvent::CardCompleted { card }) => {
                    if let Some(walk_id) = current_walk {
                        dealer.archive_completed(walk_id, &card).await;
                        tokio::time::sleep(dealer.next_card_delay + dealer.think_delay).await;
                        dealer.deal(walk_id).await;
                    }
                }
                Ok(SessionEvent::CardSkipped { .. }) => {
                    if let Some(walk_id) = current_walk {
                        tokio::time::sleep(dealer.think_delay).await;
                        dealer.deal(walk_id).await;
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dealer lagged {} session events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}
