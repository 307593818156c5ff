//! Error types for the projection engine

use fantasy_scoring::ScoringError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that abort a projection run or a single player's simulation
#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Scoring configuration error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Invalid {distribution} parameters: {message}")]
    Sampling { distribution: &'static str, message: String },

    #[error("Unsupported schedule entry for {team} week {week}: {reason}")]
    UnsupportedSchedule { team: String, week: u32, reason: String },

    #[error("Failed to build simulation worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl ProjectionError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ProjectionError::InvalidConfiguration { message: message.into() }
    }

    pub(crate) fn sampling(distribution: &'static str, err: impl fmt::Display) -> Self {
        ProjectionError::Sampling { distribution, message: err.to_string() }
    }
}

/// A player whose simulation failed and was left off the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationFailure {
    pub player_id: String,
    pub reason: String,
}

impl fmt::Display for SimulationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Simulation failed for player {}: {}", self.player_id, self.reason)
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
