//! Walk persistence.
//!
//! `WalkArchive` is the storage seam: the engine saves completed cards as
//! they happen and the full record when a walk ends, and the CLI reads
//! history back. `PgWalkArchive` is the Postgres implementation; routes
//! and emotion marks are stored as JSONB so a walk loads in one row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::ArchiveConfig;
use crate::error::MindwalkError;
use crate::models::{EmotionMark, RoutePoint, WalkCard, WalkRecord, WalkSummary};

#[async_trait]
pub trait WalkArchive: Send + Sync {
    /// Persist a finished walk. Saving the same walk twice overwrites it.
    async fn save_walk(&self, record: &WalkRecord) -> Result<(), MindwalkError>;

    /// Persist one completed card as it happens.
    async fn save_card(&self, walk_id: Uuid, card: &WalkCard) -> Result<(), MindwalkError>;

    /// Most recent walks first.
    async fn list_walks(&self, limit: i64) -> Result<Vec<WalkSummary>, MindwalkError>;

    async fn load_walk(&self, walk_id: Uuid) -> Result<WalkRecord, MindwalkError>;

    /// Completed cards for one walk, in completion order.
    async fn list_cards(&self, walk_id: Uuid) -> Result<Vec<WalkCard>, MindwalkError>;
}

// ============================================================================
// PgWalkArchive
// ============================================================================

pub struct PgWalkArchive {
    pool: PgPool,
}

impl PgWalkArchive {
    pub async fn connect(config: &ArchiveConfig) -> Result<Self, MindwalkError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        let archive = Self { pool };
        archive.ensure_schema().await?;
        Ok(archive)
    }

    pub async fn health_check(&self) -> Result<String, MindwalkError> {
        let row: (String,) = sqlx::query_as("SELECT version()")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn ensure_schema(&self) -> Result<(), MindwalkError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS walks (
                walk_id UUID PRIMARY KEY,
                started_at TIMESTAMPTZ NOT NULL,
                ended_at TIMESTAMPTZ NOT NULL,
                route JSONB NOT NULL,
                emotion_marks JSONB NOT NULL,
                cards_completed INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Cards arrive mid-walk, before the walks row exists, so no FK.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS walk_cards (
                id UUID PRIMARY KEY,
                walk_id UUID NOT NULL,
                kind TEXT NOT NULL,
                content TEXT NOT NULL,
                estimated_minutes SMALLINT,
                generated BOOLEAN NOT NULL,
                completed_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS walk_cards_walk_id_idx ON walk_cards (walk_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WalkArchive for PgWalkArchive {
    async fn save_walk(&self, record: &WalkRecord) -> Result<(), MindwalkError> {
        let route = serde_json::to_value(&record.route)?;
        let marks = serde_json::to_value(&record.emotion_marks)?;

        sqlx::query(
            r#"
            INSERT INTO walks
                (walk_id, started_at, ended_at, route, emotion_marks, cards_completed)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (walk_id)
            DO UPDATE SET
                started_at = EXCLUDED.started_at,
                ended_at = EXCLUDED.ended_at,
                route = EXCLUDED.route,
                emotion_marks = EXCLUDED.emotion_marks,
                cards_completed = EXCLUDED.cards_completed
            "#,
        )
        .bind(record.walk_id)
        .bind(record.started_at)
        .bind(record.ended_at)
        .bind(route)
        .bind(marks)
        .bind(record.cards_completed as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_card(&self, walk_id: Uuid, card: &WalkCard) -> Result<(), MindwalkError> {
        sqlx::query(
            r#"
            INSERT INTO walk_cards
                (id, walk_id, kind, content, estimated_minutes, generated, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(card.id)
        .bind(walk_id)
        .bind(card.kind.as_str())
        .bind(&card.content)
        .bind(card.estimated_minutes.map(|m| m as i16))
        .bind(card.generated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_walks(&self, limit: i64) -> Result<Vec<WalkSummary>, MindwalkError> {
        let rows = sqlx::query_as::<_, (Uuid, DateTime<Utc>, DateTime<Utc>, i32, i32, i32)>(
            r#"
            SELECT walk_id, started_at, ended_at,
                   jsonb_array_length(route) AS route_points,
                   jsonb_array_length(emotion_marks) AS emotion_marks,
                   cards_completed
            FROM walks
            ORDER BY started_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(walk_id, started_at, ended_at, route_points, emotion_marks, cards_completed)| {
                    WalkSummary {
                        walk_id,
                        started_at,
                        ended_at,
                        route_points: route_points as usize,
                        emotion_marks: emotion_marks as usize,
                        cards_completed: cards_completed as u32,
                    }
                },
            )
            .collect())
    }

    async fn load_walk(&self, walk_id: Uuid) -> Result<WalkRecord, MindwalkError> {
        let row = sqlx::query_as::<
            _,
            (
                DateTime<Utc>,
                DateTime<Utc>,
                serde_json::Value,
                serde_json::Value,
                i32,
            ),
        >(
            r#"
            SELECT started_at, ended_at, route, emotion_marks, cards_completed
            FROM walks
            WHERE walk_id = $1
            "#,
        )
        .bind(walk_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((started_at, ended_at, route, marks, cards_completed)) = row else {
            return Err(MindwalkError::WalkNotFound(walk_id));
        };

        let route: Vec<RoutePoint> = serde_json::from_value(route)?;
        let emotion_marks: Vec<EmotionMark> = serde_json::from_value(marks)?;

        Ok(WalkRecord {
            walk_id,
            started_at,
            ended_at,
            route,
            emotion_marks,
            cards_completed: cards_completed as u32,
        })
    }

    async fn list_cards(&self, walk_id: Uuid) -> Result<Vec<WalkCard>, MindwalkError> {
        let rows = sqlx::query_as::<
            _,
            (Uuid, String, String, Option<i16>, bool, DateTime<Utc>),
        >(
            r#"
            SELECT id, kind, content, estimated_minutes, generated, completed_at
            FROM walk_cards
            WHERE walk_id = $1
            ORDER BY completed_at ASC
            "#,
        )
        .bind(walk_id)
        .fetch_all(&self.pool)
        .await?;

        let cards = rows
            .into_iter()
            .filter_map(|(id, kind, content, estimated_minutes, generated, completed_at)| {
                let kind = crate::models::CardKind::parse(&kind)?;
                Some(WalkCard {
                    id,
                    kind,
                    content,
                    estimated_minutes: estimated_minutes.map(|m| m as u8),
                    generated,
                    created_at: completed_at,
                })
            })
            .collect();

        Ok(cards)
    }
}

// ============================================================================
// TESTS
// ============================================================================
