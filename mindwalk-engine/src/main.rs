use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use mindwalk_core::archive::{PgWalkArchive, WalkArchive};
use mindwalk_core::generate::create_card_source;
use mindwalk_core::session::SessionHub;
use mindwalk_core::MindwalkConfig;

use mindwalk_engine::locate::{SimulatedLocationSource, WatchOptions};
use mindwalk_engine::map::open_map;
use mindwalk_engine::subsystems::dealer::{run_dealer, Dealer};
use mindwalk_engine::subsystems::projector::{run_projector, MapProjector};
use mindwalk_engine::subsystems::prompter::{run_prompter, PromptCoordinator};
use mindwalk_engine::subsystems::tracker::{run_tracker, Tracker};
use mindwalk_engine::Autopilot;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mindwalk engine — runs a simulated walk end to end")]
struct Args {
    #[arg(short, long, default_value = "mindwalk.toml")]
    config: String,

    /// How long the demonstration walk lasts.
    #[arg(long, default_value_t = 120)]
    duration_secs: u64,

    /// Seed for the simulated stroll and the autopilot's choices.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = match MindwalkConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Persistence is optional: without it the walk still runs, nothing
    // is archived.
    let archive: Option<Arc<dyn WalkArchive>> = match &config.archive {
        Some(archive_config) => match PgWalkArchive::connect(archive_config).await {
            Ok(archive) => {
                tracing::info!("Walk archive connected");
                Some(Arc::new(archive))
            }
            Err(e) => {
                tracing::warn!("Walk archive unavailable, running without persistence: {}", e);
                None
            }
        },
        None => {
            tracing::info!("No archive configured; walk records will not be saved");
            None
        }
    };

    let profile = config.profile.to_profile();
    let hub = SessionHub::new();

    let (shutdown_tx, _) = broadcast::channel(1);
    let ctrlc_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = ctrlc_tx.send(());
        }
    });

    // Map display is optional too: a missing API key degrades to a walk
    // with no projection, not a dead engine.
    match open_map(&config.map) {
        Ok(map) => {
            let projector = MapProjector::new(map, &config.map);
            tokio::spawn(run_projector(
                projector,
                hub.subscribe(),
                shutdown_tx.subscribe(),
            ));
        }
        Err(e) => tracing::warn!("Map unavailable, running without display: {}", e),
    }

    let source = Arc::new(match args.seed {
        Some(seed) => SimulatedLocationSource::seeded(config.stroll.clone(), seed),
        None => SimulatedLocationSource::new(config.stroll.clone()),
    });
    let tracker = Tracker::new(hub.clone(), source, WatchOptions::from(&config.locate));
    tokio::spawn(run_tracker(
        tracker,
        hub.subscribe(),
        shutdown_tx.subscribe(),
    ));

    let prompter = PromptCoordinator::new(Duration::from_millis(config.prompt.auto_hide_ms));
    tokio::spawn(run_prompter(
        prompter.clone(),
        hub.subscribe(),
        profile.clone(),
        shutdown_tx.subscribe(),
    ));

    let card_source = create_card_source(&config.cards, &profile.preferences.preferred_kinds)?;
    let dealer = Dealer::new(hub.clone(), Arc::from(card_source), archive.clone(), &config.cards);
    tokio::spawn(run_dealer(dealer, hub.subscribe(), shutdown_tx.subscribe()));

    let autopilot = Autopilot::new(
        hub,
        prompter,
        archive,
        Duration::from_secs(args.duration_secs),
        args.seed,
    );
    autopilot.run(shutdown_tx.subscribe()).await;

    let _ = shutdown_tx.send(());
    Ok(())
}
