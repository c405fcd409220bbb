use thiserror::Error;

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("Ship not found: {0:?}")]
    ShipNotFound(crate::core::types::ShipId),

    #[error("Unknown ship class: {0}")]
    UnknownClass(String),

    #[error("Session closed: {0}")]
    SessionClosed(String),

    #[error("Agent failure: {0}")]
    AgentFailure(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BattleError>;
