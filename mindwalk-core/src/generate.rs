//! Card sourcing for Mindwalk
//!
//! Provides a `CardSource` trait with implementations for:
//! - **Catalog** — offline draws from the built-in prompt catalog
//! - **Remote** — personalized cards from a generator service over HTTP
//! - **Remote-fallback-catalog** — remote with graceful degradation to the catalog

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Timelike, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use uuid::Uuid;

use crate::config::CardsConfig;
use crate::deck;
use crate::geo::GeoPoint;
use crate::models::{CardKind, WalkCard};

// ============================================================================
// CardSource trait
// ============================================================================

/// Abstraction over where the next card comes from.
#[async_trait]
pub trait CardSource: Send + Sync {
    /// Draw the next card for the walk described by `req`.
    async fn draw(&self, req: &CardRequest) -> Result<WalkCard, CardSourceError>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum CardSourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Generator returned an unknown card kind: {0}")]
    UnknownKind(String),

    #[error("Generator returned empty card content")]
    EmptyContent,

    #[error("Missing generator endpoint")]
    MissingEndpoint,

    #[error("All {attempts} retry attempts failed")]
    RetryExhausted { attempts: usize },
}

// ============================================================================
// Request context
// ============================================================================

/// Coarse local-time bucket the generator personalizes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            18..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn current() -> Self {
        Self::from_hour(chrono::Local::now().hour())
    }
}

/// Everything a source may use to pick the next card.
#[derive(Debug, Clone, Serialize)]
pub struct CardRequest {
    pub location: Option<GeoPoint>,
    pub time_of_day: TimeOfDay,
    pub kinds_used: Vec<CardKind>,
    pub recent_contents: Vec<String>,
}

impl CardRequest {
    /// A bare request with nothing to steer by.
    pub fn empty() -> Self {
        Self {
            location: None,
            time_of_day: TimeOfDay::current(),
            kinds_used: Vec::new(),
            recent_contents: Vec::new(),
        }
    }
}

/// Generator client configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

// ============================================================================
// Generator API structs (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct CardResponse {
    kind: String,
    content: String,
    estimated_minutes: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: u16,
    message: String,
}

// ============================================================================
// CatalogCardSource
// ============================================================================

/// Draws from the built-in prompt catalog. Never fails, never touches
/// the network.
pub struct CatalogCardSource {
    preferred: Vec<CardKind>,
    rng: Mutex<StdRng>,
}

impl CatalogCardSource {
    pub fn new(preferred: Vec<CardKind>) -> Self {
        Self::seeded(preferred, rand::random())
    }

    /// Seeded draws for reproducible runs.
    pub fn seeded(preferred: Vec<CardKind>, seed: u64) -> Self {
        Self {
            preferred,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

#[async_trait]
impl CardSource for CatalogCardSource {
    async fn draw(&self, req: &CardRequest) -> Result<WalkCard, CardSourceError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(deck::draw_card_preferring(
            &self.preferred,
            &req.kinds_used,
            &req.recent_contents,
            &mut *rng,
        ))
    }

    fn name(&self) -> &str {
        "catalog"
    }
}

// ============================================================================
// RemoteCardClient
// ============================================================================

/// Card generator client — POSTs the request context and validates the
/// card that comes back.
#[derive(Debug, Clone)]
pub struct RemoteCardClient {
    client: Client,
    config: GeneratorConfig,
    base_url: String,
}

impl RemoteCardClient {
    pub fn new(config: GeneratorConfig) -> Result<Self, CardSourceError> {
        let Some(base_url) = config.endpoint.clone() else {
            return Err(CardSourceError::MissingEndpoint);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(
        config: GeneratorConfig,
        base_url: String,
    ) -> Result<Self, CardSourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Draw one card with retries.
    pub async fn draw_with_retry(&self, req: &CardRequest) -> Result<WalkCard, CardSourceError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        let result = Retry::spawn(retry_strategy, || self.draw_once(req)).await;

        match result {
            Ok(card) => Ok(card),
            Err(e) => {
                tracing::error!(
                    attempts = self.config.max_retries,
                    error = %e,
                    "All card draw attempts failed"
                );
                Err(CardSourceError::RetryExhausted {
                    attempts: self.config.max_retries,
                })
            }
        }
    }

    async fn draw_once(&self, req: &CardRequest) -> Result<WalkCard, CardSourceError> {
        let url = format!("{}/v1/cards/draw", self.base_url);

        let mut http_request = self.client.post(&url).json(req);
        if let Some(key) = &self.config.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, "Card generator API error");

            return Err(CardSourceError::Api { code, message });
        }

        let drawn: CardResponse = response.json().await?;

        let Some(kind) = CardKind::parse(&drawn.kind) else {
            return Err(CardSourceError::UnknownKind(drawn.kind));
        };
        if drawn.content.trim().is_empty() {
            return Err(CardSourceError::EmptyContent);
        }

        Ok(WalkCard {
            id: Uuid::new_v4(),
            kind,
            content: drawn.content,
            estimated_minutes: drawn.estimated_minutes,
            generated: true,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
impl CardSource for RemoteCardClient {
    async fn draw(&self, req: &CardRequest) -> Result<WalkCard, CardSourceError> {
        self.draw_with_retry(req).await
    }

    fn name(&self) -> &str {
        "remote"
    }
}

// ============================================================================
// FallbackCardSource
// ============================================================================

/// Wraps `RemoteCardClient`. On any error, logs a warning and draws from
/// the catalog so the walk keeps moving.
pub struct FallbackCardSource {
    remote: RemoteCardClient,
    catalog: CatalogCardSource,
}

impl FallbackCardSource {
    pub fn new(config: GeneratorConfig, preferred: Vec<CardKind>) -> Result<Self, CardSourceError> {
        Ok(Self {
            remote: RemoteCardClient::new(config)?,
            catalog: CatalogCardSource::new(preferred),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(
        config: GeneratorConfig,
        base_url: String,
        preferred: Vec<CardKind>,
    ) -> Result<Self, CardSourceError> {
        Ok(Self {
            remote: RemoteCardClient::with_base_url(config, base_url)?,
            catalog: CatalogCardSource::new(preferred),
        })
    }
}

#[async_trait]
impl CardSource for FallbackCardSource {
    async fn draw(&self, req: &CardRequest) -> Result<WalkCard, CardSourceError> {
        match self.remote.draw_with_retry(req).await {
            Ok(card) => Ok(card),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Card generator failed; drawing from the built-in catalog"
                );
                self.catalog.draw(req).await
            }
        }
    }

    fn name(&self) -> &str {
        "remote-fallback-catalog"
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Create the appropriate source from configuration. A configured
/// generator URL gets the fallback wrapper; no URL means catalog only.
pub fn create_card_source(
    config: &CardsConfig,
    preferred: &[CardKind],
) -> Result<Box<dyn CardSource>, CardSourceError> {
    match &config.generator_url {
        Some(url) => {
            let generator = GeneratorConfig {
                endpoint: Some(url.clone()),
                api_key: config.api_key.clone(),
                max_retries: config.max_retries,
                retry_delay_ms: config.retry_delay_ms,
            };
            Ok(Box::new(FallbackCardSource::new(
                generator,
                preferred.to_vec(),
            )?))
        }
        None => Ok(Box::new(CatalogCardSource::new(preferred.to_vec()))),
    }
}

// ============================================================================
// TESTS
// ============================================================================
