//! Error types for the Prop Rating Engine

use thiserror::Error;

/// Result type for Prop Rating Engine operations
pub type Result<T> = std::result::Result<T, RatingError>;

/// Caller contract violations and configuration failures.
///
/// Missing features, flat slates and stale generations are not errors; they
/// resolve to documented defaults inside the pipeline.
#[derive(Error, Debug)]
pub enum RatingError {
    #[error("Prop {prop_id} requested from an empty slate")]
    EmptySlate { prop_id: String },

    #[error("Prop {prop_id} is not part of the provided slate")]
    PropNotInSlate { prop_id: String },

    #[error("Prop {prop_id} appears more than once in the slate")]
    DuplicateProp { prop_id: String },

    #[error("Slate generation mismatch: expected {expected}, found {found}")]
    SlateMismatch { expected: u64, found: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Configuration serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
