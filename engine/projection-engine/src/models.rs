use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::SimulationFailure;

/// Fantasy positions the simulator models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
}

impl Position {
    pub const ALL: [Position; 4] = [Position::QB, Position::RB, Position::WR, Position::TE];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            other => Err(format!("Unsupported position: {other}")),
        }
    }
}

/// Per-player usage rates fed to the game simulator
///
/// Shares are fractions of team opportunities in [0, 1]; `adot` is in yards.
/// Unset fields fall back to the position defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsagePriors {
    pub completion_rate: Option<f64>,
    pub rz_share_boost: Option<f64>,
    pub rush_share: Option<f64>,
    pub target_share: Option<f64>,
    pub catch_rate: Option<f64>,
    pub adot: Option<f64>,
    pub rz_share: Option<f64>,
    pub rz_target_share: Option<f64>,
}

impl UsagePriors {
    /// Fill every unset field from `defaults`
    pub fn or(&self, defaults: &UsagePriors) -> UsagePriors {
        UsagePriors {
            completion_rate: self.completion_rate.or(defaults.completion_rate),
            rz_share_boost: self.rz_share_boost.or(defaults.rz_share_boost),
            rush_share: self.rush_share.or(defaults.rush_share),
            target_share: self.target_share.or(defaults.target_share),
            catch_rate: self.catch_rate.or(defaults.catch_rate),
            adot: self.adot.or(defaults.adot),
            rz_share: self.rz_share.or(defaults.rz_share),
            rz_target_share: self.rz_target_share.or(defaults.rz_target_share),
        }
    }
}

/// Raw historical counts a player's usage is shrunk from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageHistory {
    pub completions: u64,
    pub pass_attempts: u64,
    pub receptions: u64,
    pub targets: u64,
    pub team_targets: u64,
    pub carries: u64,
    pub team_carries: u64,
    pub red_zone_touches: u64,
    pub team_red_zone_plays: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthRole {
    #[default]
    Starter,
    Backup,
    ThirdString,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthChart {
    pub role: DepthRole,
    #[serde(default)]
    pub first_year_starter: bool,
}

/// Conference-wide averages a team's rates are shrunk toward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferenceBaseline {
    pub pace: f64,
    pub pass_rate: f64,
}

/// Team tendencies, read-only for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamContext {
    /// Offensive plays per game
    pub pace: f64,
    pub pass_rate: f64,
    /// Defensive strength multipliers: 1.0 = average, < 1.0 = stronger.
    /// Used as opponent ratings for schedule entries that omit them.
    #[serde(default = "average_strength")]
    pub pass_defense: f64,
    #[serde(default = "average_strength")]
    pub rush_defense: f64,
    #[serde(default)]
    pub conference: Option<ConferenceBaseline>,
    /// Share of last season's production that returns, in [0, 1]
    #[serde(default)]
    pub returning_production: Option<f64>,
}

fn average_strength() -> f64 {
    1.0
}

impl Default for TeamContext {
    fn default() -> Self {
        Self {
            pace: 70.0,
            pass_rate: 0.58,
            pass_defense: 1.0,
            rush_defense: 1.0,
            conference: None,
            returning_production: None,
        }
    }
}

/// One entry in a team's season schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub week: u32,
    pub is_home: bool,
    pub opponent: String,
    pub vegas_total: f64,
    /// Team-perspective point spread, negative when favored
    #[serde(default)]
    pub spread: Option<f64>,
    #[serde(default)]
    pub implied_team_total: Option<f64>,
    pub opp_pace: f64,
    /// Opponent defensive ratings; unset falls back to the opponent's team
    /// context, then to average
    #[serde(default)]
    pub opp_pass_defense: Option<f64>,
    #[serde(default)]
    pub opp_rush_defense: Option<f64>,
    /// Expected scoring margin, positive when leading
    #[serde(default)]
    pub game_script: Option<f64>,
    /// Players ruled out (injury, suspension) for this game
    #[serde(default)]
    pub inactive: BTreeSet<String>,
}

impl ScheduledGame {
    pub fn is_missed_by(&self, player_id: &str) -> bool {
        self.inactive.contains(player_id)
    }
}

/// Roster record for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: String,
    #[serde(default)]
    pub name: String,
    pub position: Position,
    pub team: String,
    #[serde(default)]
    pub team_context: TeamContext,
    #[serde(default)]
    pub usage: Option<UsagePriors>,
    #[serde(default)]
    pub history: Option<UsageHistory>,
    #[serde(default)]
    pub depth: Option<DepthChart>,
}

/// Season fantasy-point distribution for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDistribution {
    pub player_id: String,
    pub name: String,
    pub position: Position,
    pub team: String,
    /// Scheduled games, including any the player misses
    pub games: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl SeasonDistribution {
    /// Percentiles in ascending order
    pub fn percentiles(&self) -> [f64; 7] {
        [self.p10, self.p25, self.p50, self.p75, self.p90, self.p95, self.p99]
    }
}

/// One ranked row of the draft board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftBoardRow {
    #[serde(flatten)]
    pub distribution: SeasonDistribution,
    pub replacement_level: f64,
    pub vorp: f64,
    pub position_rank: usize,
    pub tier: usize,
    pub cv: f64,
    pub upside: f64,
    pub floor: f64,
    pub consistency: f64,
    pub value_score: f64,
    /// Draft-position proxy: order within position on the board
    pub adp: usize,
    pub adp_diff: i64,
    pub overall_rank: usize,
}

/// A generated draft board plus run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftBoard {
    pub generated_at: DateTime<Utc>,
    pub league_size: usize,
    pub n_sims: usize,
    pub replacement_levels: BTreeMap<Position, f64>,
    pub rows: Vec<DraftBoardRow>,
    pub failures: Vec<SimulationFailure>,
}

/// Condensed draft-day view of a board row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheatSheetRow {
    pub overall_rank: usize,
    pub player_id: String,
    pub name: String,
    pub position: Position,
    pub team: String,
    pub position_rank: usize,
    pub tier: usize,
    pub tier_label: String,
    pub mean: f64,
    pub vorp: f64,
    pub consistency: f64,
    pub upside: f64,
    pub adp_diff: i64,
}

/// Input document for a projection run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionInputs {
    pub players: Vec<PlayerInfo>,
    /// Team abbreviation -> schedule in week order
    pub schedules: BTreeMap<String, Vec<ScheduledGame>>,
}
