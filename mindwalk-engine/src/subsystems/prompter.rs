//! Prompt coordinator — emotion-selector visibility and its auto-hide
//! timer.
//!
//! The coordinator decides nothing about emotions. It owns exactly one
//! piece of state (visible or not) and exactly one pending timer. An
//! epoch counter stamps each showing; a timer that fires against a stale
//! epoch is a no-op, so auto-hide happens at most once per showing and a
//! re-show never stacks timers. What a timeout *means* (here: no mark is
//! recorded) belongs to the wiring around it.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use mindwalk_core::models::WalkerProfile;
use mindwalk_core::session::SessionEvent;

use mindwalk_core::catalog;

const PROMPT_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideReason {
    /// The walker picked an emotion.
    Selected,
    /// The countdown expired without a pick.
    AutoHide,
    /// Explicitly dismissed (overlay click).
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptEvent {
    Shown,
    Hidden { reason: HideReason },
}

#[derive(Debug)]
struct PromptState {
    visible: bool,
    /// Bumped on every show and hide; stale timers check it and bail.
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct PromptCoordinator {
    state: Arc<Mutex<PromptState>>,
    events: broadcast::Sender<PromptEvent>,
    auto_hide: Duration,
}

impl PromptCoordinator {
    pub fn new(auto_hide: Duration) -> Self {
        let (events, _) = broadcast::channel(PROMPT_EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(PromptState {
                visible: false,
                epoch: 0,
                timer: None,
            })),
            events,
            auto_hide,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PromptEvent> {
        self.events.subscribe()
    }

    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PromptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Show the selector and arm the auto-hide countdown. A no-op while
    /// already visible: the existing countdown keeps running.
    pub fn show(&self) -> bool {
        let mut state = self.lock();
        if state.visible {
            return false;
        }
        state.visible = true;
        state.epoch += 1;
        let armed_epoch = state.epoch;

        let coordinator = self.clone();
        let delay = self.auto_hide;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            coordinator.auto_hide(armed_epoch);
        }));
        drop(state);

        let _ = self.events.send(PromptEvent::Shown);
        true
    }

    /// Hide the selector and cancel any pending countdown. A no-op while
    /// already hidden.
    pub fn hide(&self, reason: HideReason) -> bool {
        let mut state = self.lock();
        if !state.visible {
            return false;
        }
        state.visible = false;
        state.epoch += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        drop(state);

        let _ = self.events.send(PromptEvent::Hidden { reason });
        true
    }

    /// Timer callback. The epoch check makes a timer that lost the race
    /// with an explicit hide (or a later re-show) do nothing.
    fn auto_hide(&self, armed_epoch: u64) {
        {
            let mut state = self.lock();
            if !state.visible || state.epoch != armed_epoch {
                return;
            }
            state.visible = false;
            state.epoch += 1;
            state.timer = None;
        }
        let _ = self.events.send(PromptEvent::Hidden {
            reason: HideReason::AutoHide,
        });
    }

    /// Scoped-resource release: hide and drop the pending timer. Safe to
    /// call repeatedly.
    pub fn dispose(&self) {
        self.hide(HideReason::Dismissed);
        if let Some(timer) = self.lock().timer.take() {
            timer.abort();
        }
    }
}

/// Subsystem loop: open the selector when a markable card completes,
/// close it when a mark lands. Timeouts record nothing.
pub async fn run_prompter(
    coordinator: PromptCoordinator,
    mut events: broadcast::Receiver<SessionEvent>,
    profile: WalkerProfile,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SessionEvent::CardCompleted { card }) => {
                    if profile.preferences.auto_emotion_prompt && catalog::is_markable(card.kind) {
                        coordinator.show();
                    }
                }
                Ok(SessionEvent::EmotionMarked { .. }) => {
                    coordinator.hide(HideReason::Selected);
                }
                Ok(SessionEvent::WalkEnded { .. }) => {
                    coordinator.hide(HideReason::Dismissed);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Prompter lagged {} session events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
    coordinator.dispose();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    const AUTO_HIDE: Duration = Duration::from_millis(8000);

    #[tokio::test(start_paused = true)]
    async fn test_auto_hide_fires_exactly_once() {
        let coordinator = PromptCoordinator::new(AUTO_HIDE);
        let mut events = coordinator.subscribe();

        assert!(coordinator.show());
        assert!(coordinator.is_visible());
        assert_eq!(events.recv().await.unwrap(), PromptEvent::Shown);

        tokio::time::sleep(AUTO_HIDE + Duration::from_millis(1)).await;
        assert!(!coordinator.is_visible());
        assert_eq!(
            events.recv().await.unwrap(),
            PromptEvent::Hidden {
                reason: HideReason::AutoHide
            }
        );

        // Well past the deadline: nothing refires.
        tokio::time::sleep(AUTO_HIDE * 3).await;
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_hide_cancels_the_countdown() {
        let coordinator = PromptCoordinator::new(AUTO_HIDE);
        let mut events = coordinator.subscribe();

        coordinator.show();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(coordinator.hide(HideReason::Selected));
        assert!(!coordinator.is_visible());

        // The original deadline passes without a second hide.
        tokio::time::sleep(AUTO_HIDE * 2).await;
        assert_eq!(events.recv().await.unwrap(), PromptEvent::Shown);
        assert_eq!(
            events.recv().await.unwrap(),
            PromptEvent::Hidden {
                reason: HideReason::Selected
            }
        );
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reshow_while_visible_does_not_stack_timers() {
        let coordinator = PromptCoordinator::new(AUTO_HIDE);
        let mut events = coordinator.subscribe();

        assert!(coordinator.show());
        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert!(!coordinator.show()); // still visible, refused

        // One auto-hide, at the original deadline.
        tokio::time::sleep(Duration::from_millis(4001)).await;
        assert!(!coordinator.is_visible());

        assert_eq!(events.recv().await.unwrap(), PromptEvent::Shown);
        assert_eq!(
            events.recv().await.unwrap(),
            PromptEvent::Hidden {
                reason: HideReason::AutoHide
            }
        );
        tokio::time::sleep(AUTO_HIDE * 2).await;
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_after_hide_arms_a_fresh_countdown() {
        let coordinator = PromptCoordinator::new(AUTO_HIDE);

        coordinator.show();
        coordinator.hide(HideReason::Dismissed);
        coordinator.show();
        assert!(coordinator.is_visible());

        // The second showing gets its full window.
        tokio::time::sleep(AUTO_HIDE - Duration::from_millis(10)).await;
        assert!(coordinator.is_visible());
        tokio::time::sleep(Duration::from_millis(11)).await;
        assert!(!coordinator.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_while_hidden_is_a_no_op() {
        let coordinator = PromptCoordinator::new(AUTO_HIDE);
        let mut events = coordinator.subscribe();
        assert!(!coordinator.hide(HideReason::Dismissed));
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }
}
