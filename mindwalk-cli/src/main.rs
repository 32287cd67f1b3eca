//! mindwalk-cli — read side of the walk archive.
//!
//! # Subcommands
//! - `history [-n <limit>] [--json]` — recent walks, newest first
//! - `show <walk-id> [--json]`       — one walk in detail
//! - `status`                        — archive connectivity check

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use mindwalk_core::archive::{PgWalkArchive, WalkArchive};
use mindwalk_core::geo::route_distance_m;
use mindwalk_core::models::{WalkRecord, WalkSummary};
use mindwalk_core::MindwalkConfig;

const DEFAULT_LIMIT: i64 = 10;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "mindwalk-cli", version, about = "Mindwalk walk-archive frontend")]
struct Cli {
    /// Config file with the [archive] section
    #[arg(short, long, env = "MINDWALK_CONFIG", default_value = "mindwalk.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List recent walks, newest first
    History {
        /// Maximum number of walks to list
        #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT)]
        limit: i64,

        /// Output as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Show one walk: route, marks, completed cards
    Show {
        /// Walk id (UUID)
        walk_id: Uuid,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check archive connectivity
    Status,
}

// ============================================================================
// Output formatting
// ============================================================================

/// "14m 05s" style duration between two instants.
pub fn format_duration(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> String {
    let secs = (ended_at - started_at).num_seconds().max(0);
    format!("{}m {:02}s", secs / 60, secs % 60)
}

/// Metres below a kilometre, one-decimal kilometres above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// One history line: id prefix, start time, duration, counters.
pub fn format_summary_line(summary: &WalkSummary) -> String {
    let id_hex = summary.walk_id.simple().to_string();
    format!(
        "#{}  {}  {}  {} pts  {} marks  {} cards",
        &id_hex[..6],
        summary.started_at.format("%Y-%m-%d %H:%M"),
        format_duration(summary.started_at, summary.ended_at),
        summary.route_points,
        summary.emotion_marks,
        summary.cards_completed,
    )
}

fn print_walk(record: &WalkRecord) {
    println!("Walk:      {}", record.walk_id);
    println!("Started:   {}", record.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Ended:     {}", record.ended_at.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "Duration:  {}",
        format_duration(record.started_at, record.ended_at)
    );
    println!(
        "Distance:  {} over {} route points",
        format_distance(route_distance_m(&record.route)),
        record.route.len()
    );
    println!("Cards:     {} completed", record.cards_completed);
    if record.emotion_marks.is_empty() {
        println!("Marks:     none");
    } else {
        println!("Marks:     {}", record.emotion_marks.len());
        for mark in &record.emotion_marks {
            println!(
                "  {} {}  ({:.5}, {:.5})  during {}",
                mark.emotion.emoji(),
                mark.emotion.label(),
                mark.lat,
                mark.lng,
                mark.card_kind,
            );
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn open_archive(config_path: &str) -> anyhow::Result<PgWalkArchive> {
    let config = MindwalkConfig::load(config_path)?;
    let Some(archive_config) = config.archive else {
        eprintln!(
            "mindwalk-cli: no [archive] section in {}; nothing to read",
            config_path
        );
        std::process::exit(1);
    };
    Ok(PgWalkArchive::connect(&archive_config).await?)
}

async fn do_history(archive: &PgWalkArchive, limit: i64, json: bool) -> anyhow::Result<()> {
    let walks = archive.list_walks(limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&walks)?);
        return Ok(());
    }
    if walks.is_empty() {
        println!("No walks recorded yet.");
        return Ok(());
    }
    for summary in &walks {
        println!("{}", format_summary_line(summary));
    }
    Ok(())
}

async fn do_show(archive: &PgWalkArchive, walk_id: Uuid, json: bool) -> anyhow::Result<()> {
    let record = archive.load_walk(walk_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }
    print_walk(&record);

    let cards = archive.list_cards(walk_id).await?;
    if !cards.is_empty() {
        println!("Completed cards:");
        for card in &cards {
            println!("  [{}] {}", card.kind, card.content);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let archive = open_archive(&cli.config).await?;

    match cli.command {
        Commands::History { limit, json } => do_history(&archive, limit, json).await?,
        Commands::Show { walk_id, json } => do_show(&archive, walk_id, json).await?,
        Commands::Status => match archive.health_check().await {
            Ok(version) => println!("Archive reachable: {}", version),
            Err(e) => {
                eprintln!("mindwalk-cli: archive unreachable: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
