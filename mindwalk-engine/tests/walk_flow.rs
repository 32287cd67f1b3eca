//! End-to-end walk flow against fake capabilities: simulated GPS feeds
//! the hub through the tracker, the dealer keeps a card in hand, the
//! prompter opens on markable completions, and ending the walk leaves
//! its data intact for the archive hand-off.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;

use mindwalk_core::catalog;
use mindwalk_core::config::{CardsConfig, LocateConfig, MapConfig, StrollConfig};
use mindwalk_core::generate::CatalogCardSource;
use mindwalk_core::geo::GeoPoint;
use mindwalk_core::models::Emotion;
use mindwalk_core::session::SessionHub;

use mindwalk_engine::locate::{SimulatedLocationSource, WatchOptions};
use mindwalk_engine::map::{MapSurface, MarkerId, MarkerSpec, PolylineId, PolylineSpec};
use mindwalk_engine::subsystems::dealer::{run_dealer, Dealer};
use mindwalk_engine::subsystems::projector::{run_projector, MapProjector};
use mindwalk_engine::subsystems::prompter::{run_prompter, PromptCoordinator};
use mindwalk_engine::subsystems::tracker::{run_tracker, Tracker};

#[derive(Debug, Default)]
struct SurfaceCounts {
    next_id: u64,
    markers: usize,
    polylines: usize,
    path_updates: usize,
    pans: usize,
}

#[derive(Clone, Default)]
struct CountingMap(Arc<Mutex<SurfaceCounts>>);

impl MapSurface for CountingMap {
    fn add_marker(&mut self, _spec: MarkerSpec) -> MarkerId {
        let mut c = self.0.lock().unwrap();
        c.next_id += 1;
        c.markers += 1;
        MarkerId(c.next_id)
    }
    fn move_marker(&mut self, _id: MarkerId, _to: GeoPoint) {}
    fn remove_marker(&mut self, _id: MarkerId) {
        self.0.lock().unwrap().markers -= 1;
    }
    fn add_polyline(&mut self, _spec: PolylineSpec) -> PolylineId {
        let mut c = self.0.lock().unwrap();
        c.next_id += 1;
        c.polylines += 1;
        PolylineId(c.next_id)
    }
    fn set_polyline_path(&mut self, _id: PolylineId, _path: Vec<GeoPoint>) {
        self.0.lock().unwrap().path_updates += 1;
    }
    fn remove_polyline(&mut self, _id: PolylineId) {
        self.0.lock().unwrap().polylines -= 1;
    }
    fn set_center(&mut self, _center: GeoPoint) {}
    fn pan_to(&mut self, _center: GeoPoint, _duration: Duration) {
        self.0.lock().unwrap().pans += 1;
    }
}

struct Rig {
    hub: SessionHub,
    prompter: PromptCoordinator,
    map: CountingMap,
    shutdown: broadcast::Sender<()>,
}

fn stroll() -> StrollConfig {
    StrollConfig {
        start_lat: 39.90923,
        start_lng: 116.397428,
        interval_ms: 200,
        step_m: 10.0, // clears the 5 m recenter gate on every step
    }
}

/// Wire every subsystem onto one hub with fake capabilities.
fn launch() -> Rig {
    let hub = SessionHub::new();
    let (shutdown, _) = broadcast::channel(1);

    let source = Arc::new(SimulatedLocationSource::seeded(stroll(), 42));
    let tracker = Tracker::new(
        hub.clone(),
        source,
        WatchOptions::from(&LocateConfig::default()),
    );
    tokio::spawn(run_tracker(tracker, hub.subscribe(), shutdown.subscribe()));

    let map = CountingMap::default();
    let projector = MapProjector::new(Box::new(map.clone()), &MapConfig::default());
    tokio::spawn(run_projector(
        projector,
        hub.subscribe(),
        shutdown.subscribe(),
    ));

    let prompter = PromptCoordinator::new(Duration::from_millis(8000));
    let profile = mindwalk_core::models::WalkerProfile::new("walk-flow-test");
    tokio::spawn(run_prompter(
        prompter.clone(),
        hub.subscribe(),
        profile,
        shutdown.subscribe(),
    ));

    let card_source = Arc::new(CatalogCardSource::seeded(Vec::new(), 11));
    let dealer = Dealer::new(hub.clone(), card_source, None, &CardsConfig::default());
    tokio::spawn(run_dealer(dealer, hub.subscribe(), shutdown.subscribe()));

    Rig {
        hub,
        prompter,
        map,
        shutdown,
    }
}

#[tokio::test(start_paused = true)]
async fn test_route_accumulates_and_projects_while_walking() {
    let rig = launch();
    rig.hub.start_walk().await;

    // Ten stroll intervals plus slack for delivery.
    tokio::time::sleep(Duration::from_millis(2100)).await;
    let route_len = rig.hub.route_len().await;
    assert!(route_len >= 9, "route only reached {}", route_len);

    {
        let counts = rig.map.0.lock().unwrap();
        assert_eq!(counts.polylines, 1);
        assert!(counts.path_updates >= route_len - 2);
        // Every 10 m step clears the recenter gate.
        assert!(counts.pans >= route_len - 1);
    }

    let record = rig.hub.end_walk().await.unwrap();
    assert_eq!(record.route.len(), route_len);

    // Fixes may keep arriving briefly; the ended walk's route is frozen.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(rig.hub.route_len().await, route_len);
    assert!(rig.hub.current_card().await.is_none());
    assert!(!rig.hub.is_walking().await);

    let _ = rig.shutdown.send(());
}

#[tokio::test(start_paused = true)]
async fn test_completion_opens_the_prompt_and_a_mark_closes_it() {
    let rig = launch();
    rig.hub.start_walk().await;

    // First card lands after the think delay; make sure a fix exists so
    // a mark has somewhere to anchor.
    tokio::time::sleep(Duration::from_millis(700)).await;
    let card = rig.hub.current_card().await.unwrap();
    assert!(rig.hub.latest_fix().await.is_some());

    rig.hub.complete_card(card.id).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    if catalog::is_markable(card.kind) {
        assert!(rig.prompter.is_visible());
        let mark = rig.hub.add_emotion_mark(Emotion::Joy).await.unwrap();
        assert_eq!(mark.card_kind, card.kind);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!rig.prompter.is_visible());

        // The selector stays closed; no auto-hide refires later.
        tokio::time::sleep(Duration::from_millis(9000)).await;
        assert!(!rig.prompter.is_visible());
    } else {
        assert!(!rig.prompter.is_visible());
    }

    let _ = rig.shutdown.send(());
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_prompt_times_out_without_a_mark() {
    let rig = launch();
    rig.hub.start_walk().await;

    // Complete cards until a markable one opens the selector.
    let mut opened = false;
    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(1700)).await;
        let Some(card) = rig.hub.current_card().await else {
            continue;
        };
        rig.hub.complete_card(card.id).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        if rig.prompter.is_visible() {
            opened = true;
            break;
        }
    }
    assert!(opened, "no markable card came up in six draws");
    let marks_before = rig.hub.emotion_marks().await.len();

    // Let the countdown expire untouched: the selector closes and no
    // implicit mark appears.
    tokio::time::sleep(Duration::from_millis(8100)).await;
    assert!(!rig.prompter.is_visible());
    assert_eq!(rig.hub.emotion_marks().await.len(), marks_before);

    let _ = rig.shutdown.send(());
}

#[tokio::test(start_paused = true)]
async fn test_restart_resets_accumulations_and_keeps_tracking() {
    let rig = launch();
    rig.hub.start_walk().await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(rig.hub.route_len().await > 0);
    rig.hub.end_walk().await.unwrap();

    rig.hub.start_walk().await;
    assert_eq!(rig.hub.route_len().await, 0);
    assert!(rig.hub.card_history().await.is_empty());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(rig.hub.route_len().await > 0, "tracking did not resume");

    let _ = rig.shutdown.send(());
}
