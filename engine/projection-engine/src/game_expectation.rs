//! Game-level expectations: plays, pass/rush mix, attempts, scoring chances

use serde::{Deserialize, Serialize};

use crate::config::GameParameters;
use crate::models::ScheduledGame;

/// Pass rates are clamped into this open interval before the logit
const PASS_RATE_BOUNDS: (f64, f64) = (0.01, 0.99);

/// Expected team volume split into pass and rush buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamAttempts {
    pub pass_attempts: f64,
    pub rush_attempts: f64,
    pub sacks: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringOpportunities {
    pub expected_tds: f64,
    pub red_zone_trips: f64,
    pub red_zone_plays: f64,
}

/// Converts pace, market lines and defensive ratings into expected volume
#[derive(Debug, Clone, Default)]
pub struct GameExpectation {
    params: GameParameters,
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl GameExpectation {
    pub fn new(params: GameParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GameParameters {
        &self.params
    }

    /// Offensive plays for one side of a game
    ///
    /// Average of both paces, nudged by home field, scaled by the square root
    /// of the market total relative to the baseline total.
    pub fn expected_plays(&self, home_pace: f64, away_pace: f64, vegas_total: f64, is_home: bool) -> f64 {
        let h = self.params.home_field_advantage;
        let base = (home_pace + away_pace) / 2.0;
        let venue = if is_home { 1.0 + h } else { 1.0 - h };
        let total_factor = (vegas_total.max(0.0) / self.params.baseline_total).sqrt();
        base * venue * total_factor
    }

    /// Pass and rush probabilities for a game, summing to 1
    ///
    /// A weak pass defense relative to the run defense pushes toward passing;
    /// a positive game script (leading) pushes toward the run.
    pub fn expected_mix(
        &self,
        pass_rate: f64,
        opp_pass_defense: f64,
        opp_rush_defense: f64,
        game_script: f64,
    ) -> (f64, f64) {
        let (lo, hi) = PASS_RATE_BOUNDS;
        let clamped = pass_rate.clamp(lo, hi);

        let shifted = logit(clamped)
            + self.params.defense_mix_sensitivity * (opp_pass_defense - opp_rush_defense)
            - self.params.game_script_sensitivity * game_script;

        let pass = logistic(shifted);
        (pass, 1.0 - pass)
    }

    /// Split plays into pass attempts and rushes
    ///
    /// Sacked dropbacks leave the pass bucket and are counted as rushes.
    pub fn calculate_team_attempts(&self, plays: f64, pass_rate: f64) -> TeamAttempts {
        let pass_plays = plays * pass_rate;
        let sacks = pass_plays * self.params.sack_rate;
        TeamAttempts {
            pass_attempts: pass_plays - sacks,
            rush_attempts: plays * (1.0 - pass_rate) + sacks,
            sacks,
        }
    }

    /// Touchdown and red-zone volume implied by a team total
    ///
    /// Reporting only: per-game sampling draws touchdowns from player usage and
    /// TD rates, not from these counts.
    pub fn calculate_scoring_opportunities(&self, team_total: f64) -> ScoringOpportunities {
        let expected_tds = team_total / self.params.points_per_touchdown;
        let red_zone_trips = expected_tds / self.params.red_zone_td_rate;
        ScoringOpportunities {
            expected_tds,
            red_zone_trips,
            red_zone_plays: red_zone_trips * self.params.plays_per_red_zone_trip,
        }
    }

    /// Points the team is expected to score in this game
    ///
    /// Feeds [`calculate_scoring_opportunities`](Self::calculate_scoring_opportunities);
    /// play volume is driven by the full game total instead.
    pub fn implied_team_total(&self, game: &ScheduledGame) -> f64 {
        match (game.implied_team_total, game.spread) {
            (Some(total), _) => total,
            (None, Some(spread)) => (game.vegas_total - spread) / 2.0,
            (None, None) => game.vegas_total / 2.0,
        }
    }

    /// Expected scoring margin from the team's perspective
    pub fn game_script(&self, game: &ScheduledGame) -> f64 {
        match (game.game_script, game.spread) {
            (Some(script), _) => script,
            (None, Some(spread)) => -spread,
            (None, None) => 0.0,
        }
    }
}
