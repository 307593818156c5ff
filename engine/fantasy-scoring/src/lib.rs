//! Fantasy Scoring
//!
//! Scoring rules for season projections: the stat vocabulary, commissioner
//! presets (standard, PPR, half PPR, 6-point passing TDs), milestone bonuses and
//! team-defense allowed bands, compiled into a calculator that turns a box-score
//! line into fantasy points.

pub mod calculator;
pub mod config;
pub mod error;
pub mod stats;

pub use calculator::{calc_points, ScoringSystem};
pub use config::{AllowedBand, BonusScope, BonusTier, ScoringConfig, ESSENTIAL_STATS, PRESETS};
pub use error::ScoringError;
pub use stats::{AllowedTotals, Stat, StatLine};
