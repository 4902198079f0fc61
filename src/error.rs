//! Error types for skirmish search

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkirmishError {
    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error("Combatant not found: {0}")]
    UnitNotFound(u32),

    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    #[error("Search invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SkirmishError>;
