//! # ProjectionEngine
//!
//! Monte Carlo season projections for fantasy football draft preparation.
//!
//! Sparse usage data is stabilized with Beta-Binomial shrinkage, each scheduled game is
//! turned into expected plays and a pass/rush mix, and individual box scores are sampled
//! per position. Thousands of season realizations per player are scored under a league's
//! rules and summarized into distributions, which the exporter ranks by value over
//! replacement and groups into tiers of statistically overlapping players.

pub mod config;
pub mod draft_board;
pub mod error;
pub mod game_expectation;
pub mod logging;
pub mod models;
pub mod player_game;
pub mod season;
pub mod seeding;
pub mod shrinkage;


#[cfg(test)]
mod integration_tests;

pub use config::ProjectionConfig;
pub use draft_board::DraftBoardExporter;
pub use error::{ProjectionError, Result, SimulationFailure};
pub use game_expectation::{GameExpectation, ScoringOpportunities, TeamAttempts};
pub use models::{
    CheatSheetRow, DraftBoard, DraftBoardRow, PlayerInfo, Position, ProjectionInputs,
    ScheduledGame, SeasonDistribution, TeamContext, UsagePriors,
};
pub use player_game::{OpponentStrength, PlayerGameSimulator};
pub use season::{SeasonSimulator, SimulationBatch};
pub use shrinkage::RateShrinkage;

/// Re-export scoring types
pub use fantasy_scoring::{ScoringConfig, ScoringSystem, Stat, StatLine};

/// Current version of the ProjectionEngine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default season realizations per player
pub const DEFAULT_N_SIMS: usize = 1000;

/// Default league size
pub const DEFAULT_LEAGUE_SIZE: usize = 12;

/// League size the configured replacement ranks are calibrated for
pub const BASELINE_LEAGUE_SIZE: usize = 12;

/// Default p75 / tier-floor ratio for staying in a tier
pub const TIER_OVERLAP_THRESHOLD: f64 = 0.95;

/// Opponent multipliers are `OPPONENT_PIVOT - strength`, so 1.0 is neutral
pub const OPPONENT_PIVOT: f64 = 2.0;
