//! Error types for fantasy scoring

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Invalid preset: {preset}. Choose from: {available}")]
    UnknownPreset { preset: String, available: String },

    #[error("Missing essential stat: {stat}")]
    MissingEssentialStat { stat: String },

    #[error("Unknown stat key: {stat}")]
    UnknownStat { stat: String },

    #[error("Scoring value for {stat} must be finite, got {value}")]
    InvalidValue { stat: String, value: f64 },

    #[error("Failed to parse scoring document: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ScoringError {
    fn from(err: serde_json::Error) -> Self {
        ScoringError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ScoringError {
    fn from(err: toml::de::Error) -> Self {
        ScoringError::Parse(err.to_string())
    }
}
