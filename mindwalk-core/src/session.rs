//! Walk session state machine and its shared event hub.
//!
//! `WalkSession` is the single source of truth for one walk: lifecycle,
//! route accumulation, card history, and emotion marks. It is a plain
//! synchronous struct; every mutation returns the event it produced (or
//! `None` for a silently refused call). `SessionHub` wraps it for the
//! runtime: subsystems mutate through the hub and observe each other's
//! effects on a broadcast channel, never touching session state directly.
//!
//! Guarded refusals (stale card ids, marks without a fix or card, ends
//! while idle) are expected races, not faults — they return `None` and
//! leave state untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::models::{
    Emotion, EmotionMark, PositionSample, RoutePoint, WalkCard, WalkRecord, WalkStatus,
};

/// Broadcast buffer for session events.
const EVENT_CAPACITY: usize = 64;

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone)]
pub enum SessionEvent {
    WalkStarted { walk_id: Uuid },
    WalkEnded { record: WalkRecord },
    FixApplied { fix: PositionSample, appended: bool },
    CardPresented { card: WalkCard },
    CardCompleted { card: WalkCard },
    CardSkipped { card: WalkCard },
    EmotionMarked { mark: EmotionMark },
}

// ============================================================================
// WalkSession
// ============================================================================

#[derive(Debug)]
pub struct WalkSession {
    status: WalkStatus,
    walk_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    latest_fix: Option<PositionSample>,
    route: Vec<RoutePoint>,
    emotion_marks: Vec<EmotionMark>,
    card_history: Vec<WalkCard>,
    current_card: Option<WalkCard>,
}

impl WalkSession {
    pub fn new() -> Self {
        Self {
            status: WalkStatus::NotStarted,
            walk_id: None,
            started_at: None,
            ended_at: None,
            latest_fix: None,
            route: Vec::new(),
            emotion_marks: Vec::new(),
            card_history: Vec::new(),
            current_card: None,
        }
    }

    pub fn status(&self) -> WalkStatus {
        self.status
    }

    pub fn is_walking(&self) -> bool {
        self.status == WalkStatus::Active
    }

    pub fn walk_id(&self) -> Option<Uuid> {
        self.walk_id
    }

    pub fn latest_fix(&self) -> Option<PositionSample> {
        self.latest_fix
    }

    pub fn route(&self) -> &[RoutePoint] {
        &self.route
    }

    pub fn emotion_marks(&self) -> &[EmotionMark] {
        &self.emotion_marks
    }

    pub fn card_history(&self) -> &[WalkCard] {
        &self.card_history
    }

    pub fn current_card(&self) -> Option<&WalkCard> {
        self.current_card.as_ref()
    }

    /// Begin a fresh walk. All accumulations from any prior walk are
    /// cleared; calling while a walk is active discards it and starts over.
    /// The latest fix survives — the device did not move because a walk
    /// ended.
    pub fn start_walk(&mut self, now: DateTime<Utc>) -> SessionEvent {
        let walk_id = Uuid::new_v4();
        self.status = WalkStatus::Active;
        self.walk_id = Some(walk_id);
        self.started_at = Some(now);
        self.ended_at = None;
        self.route.clear();
        self.emotion_marks.clear();
        self.card_history.clear();
        self.current_card = None;
        SessionEvent::WalkStarted { walk_id }
    }

    /// End the active walk and return its archive snapshot. Route, marks,
    /// and history stay readable until the next `start_walk` wipes them.
    pub fn end_walk(&mut self, now: DateTime<Utc>) -> Option<SessionEvent> {
        if self.status != WalkStatus::Active {
            return None;
        }
        let (Some(walk_id), Some(started_at)) = (self.walk_id, self.started_at) else {
            return None;
        };
        self.status = WalkStatus::Ended;
        self.ended_at = Some(now);
        self.current_card = None;
        let record = WalkRecord {
            walk_id,
            started_at,
            ended_at: now,
            route: self.route.clone(),
            emotion_marks: self.emotion_marks.clone(),
            cards_completed: self.card_history.len() as u32,
        };
        Some(SessionEvent::WalkEnded { record })
    }

    /// Apply one geolocation fix. The latest position always updates;
    /// a route point is appended only while a walk is active. Fixes are
    /// accepted in call order — no dedup, no reordering by timestamp.
    pub fn update_location(&mut self, fix: PositionSample) -> SessionEvent {
        self.latest_fix = Some(fix);
        let appended = self.status == WalkStatus::Active;
        if appended {
            self.route.push(RoutePoint::from(&fix));
        }
        SessionEvent::FixApplied { fix, appended }
    }

    /// Make `card` the current card. Refused outside an active walk, which
    /// swallows draws that finish after `end_walk`.
    pub fn present_card(&mut self, card: WalkCard) -> Option<SessionEvent> {
        if self.status != WalkStatus::Active {
            return None;
        }
        self.current_card = Some(card.clone());
        Some(SessionEvent::CardPresented { card })
    }

    /// Complete the current card. Stale ids are refused. The completed
    /// card stays current until the next `present_card` or `end_walk`:
    /// a mark tagged from the selector window must stamp its kind.
    pub fn complete_card(&mut self, card_id: Uuid) -> Option<SessionEvent> {
        let card = self.current_card.as_ref()?;
        if card.id != card_id {
            return None;
        }
        let card = card.clone();
        self.card_history.push(card.clone());
        Some(SessionEvent::CardCompleted { card })
    }

    /// Skip the current card. Stale ids are refused; history is untouched.
    pub fn skip_card(&mut self, card_id: Uuid) -> Option<SessionEvent> {
        let card = self.current_card.as_ref()?;
        if card.id != card_id {
            return None;
        }
        let card = card.clone();
        Some(SessionEvent::CardSkipped { card })
    }

    /// Tag an emotion at the latest position, stamped with the current
    /// card's kind. Refused unless both exist.
    pub fn add_emotion_mark(&mut self, emotion: Emotion, now: DateTime<Utc>) -> Option<SessionEvent> {
        let fix = self.latest_fix.as_ref()?;
        let card = self.current_card.as_ref()?;
        let mark = EmotionMark {
            id: Uuid::new_v4(),
            lat: fix.lat,
            lng: fix.lng,
            emotion,
            marked_at: now,
            card_kind: card.kind,
        };
        self.emotion_marks.push(mark.clone());
        Some(SessionEvent::EmotionMarked { mark })
    }
}

impl Default for WalkSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SessionHub
// ============================================================================

/// Shared handle to the session: a lock around `WalkSession` plus the
/// event broadcast. Cheap to clone; one per runtime.
#[derive(Clone)]
pub struct SessionHub {
    session: Arc<RwLock<WalkSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHub {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session: Arc::new(RwLock::new(WalkSession::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.events.send(event);
    }

    pub async fn start_walk(&self) -> Uuid {
        let (walk_id, event) = {
            let mut session = self.session.write().await;
            let event = session.start_walk(Utc::now());
            (session.walk_id().unwrap_or_default(), event)
        };
        self.publish(event);
        walk_id
    }

    pub async fn end_walk(&self) -> Option<WalkRecord> {
        let event = self.session.write().await.end_walk(Utc::now());
        match event {
            Some(SessionEvent::WalkEnded { record }) => {
                self.publish(SessionEvent::WalkEnded {
                    record: record.clone(),
                });
                Some(record)
            }
            _ => None,
        }
    }

    /// Returns whether the fix was appended to the route.
    pub async fn update_location(&self, fix: PositionSample) -> bool {
        let event = self.session.write().await.update_location(fix);
        let appended = matches!(event, SessionEvent::FixApplied { appended: true, .. });
        self.publish(event);
        appended
    }

    /// Returns whether the card was accepted as current.
    pub async fn present_card(&self, card: WalkCard) -> bool {
        match self.session.write().await.present_card(card) {
            Some(event) => {
                self.publish(event);
                true
            }
            None => false,
        }
    }

    pub async fn complete_card(&self, card_id: Uuid) -> bool {
        match self.session.write().await.complete_card(card_id) {
            Some(event) => {
                self.publish(event);
                true
            }
            None => false,
        }
    }

    pub async fn skip_card(&self, card_id: Uuid) -> bool {
        match self.session.write().await.skip_card(card_id) {
            Some(event) => {
                self.publish(event);
                true
            }
            None => false,
        }
    }

    pub async fn add_emotion_mark(&self, emotion: Emotion) -> Option<EmotionMark> {
        let event = self
            .session
            .write()
            .await
            .add_emotion_mark(emotion, Utc::now());
        match event {
            Some(SessionEvent::EmotionMarked { mark }) => {
                self.publish(SessionEvent::EmotionMarked { mark: mark.clone() });
                Some(mark)
            }
            _ => None,
        }
    }

    pub async fn is_walking(&self) -> bool {
        self.session.read().await.is_walking()
    }

    pub async fn walk_id(&self) -> Option<Uuid> {
        self.session.read().await.walk_id()
    }

    pub async fn latest_fix(&self) -> Option<PositionSample> {
        self.session.read().await.latest_fix()
    }

    pub async fn current_card(&self) -> Option<WalkCard> {
        self.session.read().await.current_card().cloned()
    }

    pub async fn card_history(&self) -> Vec<WalkCard> {
        self.session.read().await.card_history().to_vec()
    }

    pub async fn route_len(&self) -> usize {
        self.session.read().await.route().len()
    }

    pub async fn emotion_marks(&self) -> Vec<EmotionMark> {
        self.session.read().await.emotion_marks().to_vec()
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardKind;
    use chrono::TimeZone;

    fn ts(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn fix(lat: f64, lng: f64, millis: i64) -> PositionSample {
        PositionSample {
            lat,
            lng,
            accuracy_m: Some(10.0),
            timestamp: ts(millis),
        }
    }

    fn card(kind: CardKind) -> WalkCard {
        WalkCard::new(kind, "test prompt", None)
    }

    #[test]
    fn test_start_walk_resets_previous_session_data() {
        let mut session = WalkSession::new();
        session.start_walk(ts(0));
        let first_id = session.walk_id().unwrap();
        session.update_location(fix(39.9, 116.4, 1000));
        let c = card(CardKind::Observation);
        session.present_card(c.clone());
        session.complete_card(c.id);
        session.add_emotion_mark(Emotion::Joy, ts(2000));
        session.end_walk(ts(3000));

        session.start_walk(ts(4000));
        assert!(session.is_walking());
        assert_ne!(session.walk_id().unwrap(), first_id);
        assert!(session.route().is_empty());
        assert!(session.card_history().is_empty());
        assert!(session.emotion_marks().is_empty());
        assert!(session.current_card().is_none());
        // Device position is not part of walk state.
        assert!(session.latest_fix().is_some());
    }

    #[test]
    fn test_route_appends_in_call_order_only_while_active() {
        let mut session = WalkSession::new();

        let early = session.update_location(fix(39.89, 116.39, 500));
        assert!(matches!(
            early,
            SessionEvent::FixApplied {
                appended: false,
                ..
            }
        ));
        assert!(session.route().is_empty());
        assert!(session.latest_fix().is_some());

        session.start_walk(ts(900));
        session.update_location(fix(39.9, 116.4, 1000));
        session.update_location(fix(39.9001, 116.4001, 2000));
        assert_eq!(session.route().len(), 2);
        assert_eq!(session.route()[0].timestamp, ts(1000));
        assert_eq!(session.route()[1].timestamp, ts(2000));

        session.end_walk(ts(3000));
        assert!(session.current_card().is_none());
        assert!(!session.is_walking());
        // Data survives until the next start_walk.
        assert_eq!(session.route().len(), 2);
    }

    #[test]
    fn test_fixes_after_end_update_position_but_not_route() {
        let mut session = WalkSession::new();
        session.start_walk(ts(0));
        session.update_location(fix(39.9, 116.4, 1000));
        session.end_walk(ts(2000));

        let late = session.update_location(fix(39.91, 116.41, 3000));
        assert!(matches!(
            late,
            SessionEvent::FixApplied {
                appended: false,
                ..
            }
        ));
        assert_eq!(session.route().len(), 1);
        assert_eq!(session.latest_fix().unwrap().lat, 39.91);
    }

    #[test]
    fn test_stale_complete_and_skip_leave_state_unchanged() {
        let mut session = WalkSession::new();
        session.start_walk(ts(0));
        let current = card(CardKind::Reflection);
        session.present_card(current.clone());

        assert!(session.complete_card(Uuid::new_v4()).is_none());
        assert!(session.skip_card(Uuid::new_v4()).is_none());
        assert!(session.card_history().is_empty());
        assert_eq!(session.current_card().unwrap().id, current.id);
    }

    #[test]
    fn test_complete_keeps_card_current_for_the_selector_window() {
        let mut session = WalkSession::new();
        session.start_walk(ts(0));
        session.update_location(fix(39.9, 116.4, 1000));
        let current = card(CardKind::Interaction);
        session.present_card(current.clone());

        let event = session.complete_card(current.id);
        assert!(matches!(event, Some(SessionEvent::CardCompleted { .. })));
        assert_eq!(session.card_history().len(), 1);
        assert_eq!(session.current_card().unwrap().id, current.id);

        // A mark tagged after completion stamps the completed card's kind.
        let event = session.add_emotion_mark(Emotion::Surprise, ts(2000)).unwrap();
        let SessionEvent::EmotionMarked { mark } = event else {
            panic!("expected EmotionMarked");
        };
        assert_eq!(mark.card_kind, CardKind::Interaction);
        assert_eq!(mark.lat, 39.9);
    }

    #[test]
    fn test_skip_records_nothing() {
        let mut session = WalkSession::new();
        session.start_walk(ts(0));
        let current = card(CardKind::Movement);
        session.present_card(current.clone());

        let event = session.skip_card(current.id);
        assert!(matches!(event, Some(SessionEvent::CardSkipped { .. })));
        assert!(session.card_history().is_empty());
    }

    #[test]
    fn test_mark_requires_both_fix_and_current_card() {
        let mut session = WalkSession::new();
        session.start_walk(ts(0));

        // No fix, no card.
        assert!(session.add_emotion_mark(Emotion::Calm, ts(100)).is_none());

        // Fix but no card.
        session.update_location(fix(39.9, 116.4, 200));
        assert!(session.add_emotion_mark(Emotion::Calm, ts(300)).is_none());
        assert!(session.emotion_marks().is_empty());

        // Both present.
        session.present_card(card(CardKind::Observation));
        assert!(session.add_emotion_mark(Emotion::Calm, ts(400)).is_some());
        assert_eq!(session.emotion_marks().len(), 1);
    }

    #[test]
    fn test_end_walk_snapshot_and_guards() {
        let mut session = WalkSession::new();
        assert!(session.end_walk(ts(0)).is_none());

        session.start_walk(ts(100));
        session.update_location(fix(39.9, 116.4, 1000));
        let current = card(CardKind::Observation);
        session.present_card(current.clone());
        session.complete_card(current.id);
        session.add_emotion_mark(Emotion::Joy, ts(1500));

        let event = session.end_walk(ts(2000)).unwrap();
        let SessionEvent::WalkEnded { record } = event else {
            panic!("expected WalkEnded");
        };
        assert_eq!(record.started_at, ts(100));
        assert_eq!(record.ended_at, ts(2000));
        assert_eq!(record.route.len(), 1);
        assert_eq!(record.emotion_marks.len(), 1);
        assert_eq!(record.cards_completed, 1);

        // Ending twice is a silent no-op.
        assert!(session.end_walk(ts(3000)).is_none());
    }

    #[test]
    fn test_restart_while_active_discards_the_walk_in_progress() {
        let mut session = WalkSession::new();
        session.start_walk(ts(0));
        let first_id = session.walk_id().unwrap();
        session.update_location(fix(39.9, 116.4, 1000));

        session.start_walk(ts(2000));
        assert!(session.is_walking());
        assert_ne!(session.walk_id().unwrap(), first_id);
        assert!(session.route().is_empty());
    }

    #[test]
    fn test_present_refused_when_not_active() {
        let mut session = WalkSession::new();
        assert!(session.present_card(card(CardKind::Discovery)).is_none());

        session.start_walk(ts(0));
        session.end_walk(ts(1000));
        assert!(session.present_card(card(CardKind::Discovery)).is_none());
        assert!(session.current_card().is_none());
    }

    // ------------------------------------------------------------------
    // SessionHub
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_hub_broadcasts_events_in_order() {
        let hub = SessionHub::new();
        let mut events = hub.subscribe();

        let walk_id = hub.start_walk().await;
        assert!(hub.update_location(fix(39.9, 116.4, 1000)).await);

        match events.recv().await.unwrap() {
            SessionEvent::WalkStarted { walk_id: id } => assert_eq!(id, walk_id),
            other => panic!("expected WalkStarted, got {:?}", other),
        }
        match events.recv().await.unwrap() {
            SessionEvent::FixApplied { appended, .. } => assert!(appended),
            other => panic!("expected FixApplied, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hub_end_walk_returns_the_record() {
        let hub = SessionHub::new();
        hub.start_walk().await;
        hub.update_location(fix(39.9, 116.4, 1000)).await;

        let record = hub.end_walk().await.unwrap();
        assert_eq!(record.route.len(), 1);
        assert!(hub.end_walk().await.is_none());
        assert!(!hub.is_walking().await);
    }

    #[tokio::test]
    async fn test_hub_refuses_stale_present_after_end() {
        let hub = SessionHub::new();
        hub.start_walk().await;
        hub.end_walk().await;

        assert!(!hub.present_card(card(CardKind::Observation)).await);
        assert!(hub.current_card().await.is_none());
    }
}
