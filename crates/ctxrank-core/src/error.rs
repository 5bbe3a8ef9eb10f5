use thiserror::Error;

use crate::entity::{EntityId, EntityType};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Entity type conflict: {name} is registered as {existing} but was seen as {seen}")]
    TypeConflict {
        name: String,
        existing: EntityType,
        seen: EntityType,
    },

    #[error("Invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("Entity not found: {0}")]
    UnknownEntity(EntityId),

    #[error("Invalid split parameters: {0}")]
    InvalidSplit(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
