//! Stat vocabulary shared by the scoring rules and the simulators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

/// Every stat a scoring configuration can assign points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stat {
    // Passing
    PassAttempts,
    Completions,
    PassingYards,
    PassingTds,
    Interceptions,

    // Rushing
    RushAttempts,
    RushingYards,
    RushingTds,

    // Receiving
    Targets,
    Receptions,
    ReceivingYards,
    ReceivingTds,

    // Miscellaneous offense
    TwoPointConversions,
    FumblesLost,

    // Kicking
    FgMade0To19,
    FgMade20To29,
    FgMade30To39,
    FgMade40To49,
    FgMade50Plus,
    FgMissed0To19,
    FgMissed20To29,
    FgMissed30To39,
    FgMissed40To49,
    FgMissed50Plus,
    PatMade,
    PatMissed,

    // Defense / special teams
    DefSacks,
    DefInterceptions,
    DefFumblesRecovered,
    DefFumblesForced,
    DefTds,
    DefSafeties,
    DefBlocks,
    ReturnTds,
}

impl Stat {
    /// Number of stats in the vocabulary
    pub const COUNT: usize = 34;

    /// All stats in index order
    pub const ALL: [Stat; Stat::COUNT] = [
        Stat::PassAttempts,
        Stat::Completions,
        Stat::PassingYards,
        Stat::PassingTds,
        Stat::Interceptions,
        Stat::RushAttempts,
        Stat::RushingYards,
        Stat::RushingTds,
        Stat::Targets,
        Stat::Receptions,
        Stat::ReceivingYards,
        Stat::ReceivingTds,
        Stat::TwoPointConversions,
        Stat::FumblesLost,
        Stat::FgMade0To19,
        Stat::FgMade20To29,
        Stat::FgMade30To39,
        Stat::FgMade40To49,
        Stat::FgMade50Plus,
        Stat::FgMissed0To19,
        Stat::FgMissed20To29,
        Stat::FgMissed30To39,
        Stat::FgMissed40To49,
        Stat::FgMissed50Plus,
        Stat::PatMade,
        Stat::PatMissed,
        Stat::DefSacks,
        Stat::DefInterceptions,
        Stat::DefFumblesRecovered,
        Stat::DefFumblesForced,
        Stat::DefTds,
        Stat::DefSafeties,
        Stat::DefBlocks,
        Stat::ReturnTds,
    ];

    /// Position of this stat in a [`StatLine`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Key used in scoring documents (e.g. "passing_yards")
    pub fn key(self) -> &'static str {
        match self {
            Stat::PassAttempts => "passing_attempts",
            Stat::Completions => "passing_completions",
            Stat::PassingYards => "passing_yards",
            Stat::PassingTds => "passing_tds",
            Stat::Interceptions => "passing_ints",
            Stat::RushAttempts => "rushing_attempts",
            Stat::RushingYards => "rushing_yards",
            Stat::RushingTds => "rushing_tds",
            Stat::Targets => "receiving_targets",
            Stat::Receptions => "receiving_receptions",
            Stat::ReceivingYards => "receiving_yards",
            Stat::ReceivingTds => "receiving_tds",
            Stat::TwoPointConversions => "two_point_conversions",
            Stat::FumblesLost => "fumbles_lost",
            Stat::FgMade0To19 => "fg_made_0_19",
            Stat::FgMade20To29 => "fg_made_20_29",
            Stat::FgMade30To39 => "fg_made_30_39",
            Stat::FgMade40To49 => "fg_made_40_49",
            Stat::FgMade50Plus => "fg_made_50_plus",
            Stat::FgMissed0To19 => "fg_missed_0_19",
            Stat::FgMissed20To29 => "fg_missed_20_29",
            Stat::FgMissed30To39 => "fg_missed_30_39",
            Stat::FgMissed40To49 => "fg_missed_40_49",
            Stat::FgMissed50Plus => "fg_missed_50_plus",
            Stat::PatMade => "pat_made",
            Stat::PatMissed => "pat_missed",
            Stat::DefSacks => "def_sacks",
            Stat::DefInterceptions => "def_ints",
            Stat::DefFumblesRecovered => "def_fumbles_recovered",
            Stat::DefFumblesForced => "def_fumbles_forced",
            Stat::DefTds => "def_tds",
            Stat::DefSafeties => "def_safeties",
            Stat::DefBlocks => "def_blocks",
            Stat::ReturnTds => "return_tds",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Stat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stat::ALL.iter().copied().find(|stat| stat.key() == s).ok_or_else(|| s.to_string())
    }
}

/// Points and yards a team defense gave up in one game (or season)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AllowedTotals {
    pub points_allowed: f64,
    pub yards_allowed: f64,
}

/// A box-score line: one value per [`Stat`]
///
/// Counting stats are stored as `f64` so simulated yardage and season sums
/// share one representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatLine {
    values: [f64; Stat::COUNT],

    /// Only present on team defense lines
    pub allowed: Option<AllowedTotals>,
}

impl Default for StatLine {
    fn default() -> Self {
        Self { values: [0.0; Stat::COUNT], allowed: None }
    }
}

impl StatLine {
    /// An all-zero line
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, stat: Stat, value: f64) -> Self {
        self.set(stat, value);
        self
    }

    pub fn get(&self, stat: Stat) -> f64 {
        self.values[stat.index()]
    }

    pub fn set(&mut self, stat: Stat, value: f64) {
        self.values[stat.index()] = value;
    }

    /// Raw values in [`Stat::ALL`] order
    pub fn values(&self) -> &[f64; Stat::COUNT] {
        &self.values
    }

    /// True when every stat is zero and no allowed totals are attached
    pub fn is_empty(&self) -> bool {
        self.allowed.is_none() && self.values.iter().all(|v| *v == 0.0)
    }
}

impl AddAssign<&StatLine> for StatLine {
    fn add_assign(&mut self, rhs: &StatLine) {
        for (lhs, rhs) in self.values.iter_mut().zip(rhs.values.iter()) {
            *lhs += rhs;
        }
        self.allowed = match (self.allowed, rhs.allowed) {
            (Some(a), Some(b)) => Some(AllowedTotals {
                points_allowed: a.points_allowed + b.points_allowed,
                yards_allowed: a.yards_allowed + b.yards_allowed,
            }),
            (a, b) => a.or(b),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_keys_round_trip() {
        for stat in Stat::ALL {
            assert_eq!(stat.key().parse::<Stat>(), Ok(stat));
        }
        assert!("passing_furlongs".parse::<Stat>().is_err());
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, stat) in Stat::ALL.iter().enumerate() {
            assert_eq!(stat.index(), i, "{stat} is out of order");
        }
    }

    #[test]
    fn test_accumulate_lines() {
        let mut season = StatLine::new();
        let game = StatLine::new().with(Stat::ReceivingYards, 87.5).with(Stat::Receptions, 6.0);

        season += &game;
        season += &game;

        assert_eq!(season.get(Stat::ReceivingYards), 175.0);
        assert_eq!(season.get(Stat::Receptions), 12.0);
        assert_eq!(season.get(Stat::PassingYards), 0.0);
        assert_eq!(season.values().iter().filter(|v| **v != 0.0).count(), 2);
    }

    #[test]
    fn test_accumulate_allowed_totals() {
        let mut season = StatLine::new();
        let mut game = StatLine::new();
        game.allowed = Some(AllowedTotals { points_allowed: 17.0, yards_allowed: 310.0 });

        season += &game;
        season += &game;

        let allowed = season.allowed.expect("allowed totals should carry over");
        assert_eq!(allowed.points_allowed, 34.0);
        assert_eq!(allowed.yards_allowed, 620.0);
    }

    #[test]
    fn test_empty_line() {
        assert!(StatLine::new().is_empty());
        assert!(!StatLine::new().with(Stat::Targets, 1.0).is_empty());
    }
}
