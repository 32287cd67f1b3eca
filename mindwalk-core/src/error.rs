use thiserror::Error;

#[derive(Error, Debug)]
pub enum MindwalkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Walk not found: {0}")]
    WalkNotFound(uuid::Uuid),

    #[error("Other error: {0}")]
    Other(String),
}
