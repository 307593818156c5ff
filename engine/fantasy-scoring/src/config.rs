use crate::error::ScoringError;
use crate::stats::Stat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Stats every scoring document must price
pub const ESSENTIAL_STATS: [Stat; 6] = [
    Stat::PassingYards,
    Stat::PassingTds,
    Stat::RushingYards,
    Stat::RushingTds,
    Stat::ReceivingYards,
    Stat::ReceivingTds,
];

/// Names accepted by [`ScoringConfig::preset`]
pub const PRESETS: [&str; 4] = ["standard", "ppr", "half_ppr", "6pt_passing_td"];

/// Commissioner-configurable scoring rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Preset this document started from ("custom" when hand-written)
    #[serde(default = "default_preset_name")]
    pub preset: String,

    /// Points per unit of each stat, keyed by [`Stat::key`]
    pub points: BTreeMap<String, f64>,

    /// Yardage milestone bonuses
    #[serde(default)]
    pub bonuses: Vec<BonusTier>,

    /// Team defense points-allowed bands, checked in order
    #[serde(default = "default_points_allowed_bands")]
    pub points_allowed_bands: Vec<AllowedBand>,

    /// Team defense yards-allowed bands, checked in order
    #[serde(default = "default_yards_allowed_bands")]
    pub yards_allowed_bands: Vec<AllowedBand>,

    /// Whether milestone bonuses are judged per game or on season totals
    #[serde(default)]
    pub bonus_scope: BonusScope,
}

/// One milestone: reaching `threshold` of `stat` pays `points`
///
/// Tiers on the same stat are not cumulative; only the highest tier reached pays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTier {
    pub stat: String,
    pub threshold: f64,
    pub points: f64,
}

/// Pays `points` when the allowed value is strictly below `below`
///
/// A band without `below` matches anything and should be last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowedBand {
    pub below: Option<f64>,
    pub points: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusScope {
    /// Bonuses are judged on the accumulated season line
    #[default]
    Season,
    /// Bonuses are judged on each game line and summed
    Game,
}

fn default_preset_name() -> String {
    "custom".to_string()
}

fn band(below: Option<f64>, points: f64) -> AllowedBand {
    AllowedBand { below, points }
}

fn default_points_allowed_bands() -> Vec<AllowedBand> {
    vec![
        band(Some(1.0), 10.0),
        band(Some(7.0), 7.0),
        band(Some(14.0), 4.0),
        band(Some(21.0), 1.0),
        band(Some(28.0), 0.0),
        band(Some(35.0), -1.0),
        band(None, -4.0),
    ]
}

fn default_yards_allowed_bands() -> Vec<AllowedBand> {
    vec![
        band(Some(100.0), 10.0),
        band(Some(200.0), 5.0),
        band(Some(300.0), 3.0),
        band(Some(400.0), 0.0),
        band(Some(450.0), -1.0),
        band(Some(500.0), -3.0),
        band(None, -5.0),
    ]
}

fn default_bonuses() -> Vec<BonusTier> {
    let tier = |stat: Stat, threshold: f64| BonusTier {
        stat: stat.key().to_string(),
        threshold,
        points: 0.0,
    };
    vec![
        tier(Stat::PassingYards, 300.0),
        tier(Stat::PassingYards, 400.0),
        tier(Stat::RushingYards, 100.0),
        tier(Stat::RushingYards, 200.0),
        tier(Stat::ReceivingYards, 100.0),
        tier(Stat::ReceivingYards, 200.0),
    ]
}

impl Default for ScoringConfig {
    /// Standard (non-PPR) scoring
    fn default() -> Self {
        let points = [
            // Passing: 1 point per 25 yards
            (Stat::PassingYards, 0.04),
            (Stat::PassingTds, 4.0),
            (Stat::Interceptions, -2.0),
            // Rushing: 1 point per 10 yards
            (Stat::RushingYards, 0.1),
            (Stat::RushingTds, 6.0),
            // Receiving
            (Stat::ReceivingYards, 0.1),
            (Stat::ReceivingTds, 6.0),
            (Stat::Receptions, 0.0),
            (Stat::TwoPointConversions, 2.0),
            (Stat::FumblesLost, -2.0),
            // Kicking
            (Stat::FgMade0To19, 3.0),
            (Stat::FgMade20To29, 3.0),
            (Stat::FgMade30To39, 3.0),
            (Stat::FgMade40To49, 4.0),
            (Stat::FgMade50Plus, 5.0),
            (Stat::FgMissed0To19, -2.0),
            (Stat::FgMissed20To29, -1.0),
            (Stat::FgMissed30To39, -1.0),
            (Stat::FgMissed40To49, 0.0),
            (Stat::FgMissed50Plus, 0.0),
            (Stat::PatMade, 1.0),
            (Stat::PatMissed, -1.0),
            // Defense / special teams
            (Stat::DefSacks, 1.0),
            (Stat::DefInterceptions, 2.0),
            (Stat::DefFumblesRecovered, 2.0),
            (Stat::DefFumblesForced, 1.0),
            (Stat::DefTds, 6.0),
            (Stat::DefSafeties, 2.0),
            (Stat::DefBlocks, 2.0),
            (Stat::ReturnTds, 6.0),
        ]
        .into_iter()
        .map(|(stat, value)| (stat.key().to_string(), value))
        .collect();

        Self {
            preset: "standard".to_string(),
            points,
            bonuses: default_bonuses(),
            points_allowed_bands: default_points_allowed_bands(),
            yards_allowed_bands: default_yards_allowed_bands(),
            bonus_scope: BonusScope::Season,
        }
    }
}

impl ScoringConfig {
    /// Build one of the named presets
    pub fn preset(name: &str) -> Result<Self, ScoringError> {
        let mut config = Self::default();
        match name {
            "standard" => {}
            "ppr" => config.set(Stat::Receptions, 1.0),
            "half_ppr" => config.set(Stat::Receptions, 0.5),
            "6pt_passing_td" => config.set(Stat::PassingTds, 6.0),
            _ => {
                return Err(ScoringError::UnknownPreset {
                    preset: name.to_string(),
                    available: PRESETS.join(", "),
                })
            }
        }
        config.preset = name.to_string();
        Ok(config)
    }

    /// Multiplier for a stat, zero when the document does not price it
    pub fn multiplier(&self, stat: Stat) -> f64 {
        self.points.get(stat.key()).copied().unwrap_or(0.0)
    }

    fn set(&mut self, stat: Stat, value: f64) {
        self.points.insert(stat.key().to_string(), value);
    }

    /// Override one multiplier
    pub fn customize(&mut self, stat: &str, value: f64) -> Result<(), ScoringError> {
        let parsed: Stat =
            stat.parse().map_err(|stat| ScoringError::UnknownStat { stat })?;
        if !value.is_finite() {
            return Err(ScoringError::InvalidValue { stat: stat.to_string(), value });
        }
        self.set(parsed, value);
        Ok(())
    }

    pub fn from_json_str(content: &str) -> Result<Self, ScoringError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ScoringError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a `.toml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScoringError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Check the document and return non-fatal warnings
    ///
    /// Missing essential stats, unknown keys and non-finite values are errors.
    pub fn validate(&self) -> Result<Vec<String>, ScoringError> {
        for stat in ESSENTIAL_STATS {
            if !self.points.contains_key(stat.key()) {
                return Err(ScoringError::MissingEssentialStat { stat: stat.key().to_string() });
            }
        }

        for (key, value) in &self.points {
            key.parse::<Stat>().map_err(|stat| ScoringError::UnknownStat { stat })?;
            if !value.is_finite() {
                return Err(ScoringError::InvalidValue { stat: key.clone(), value: *value });
            }
        }

        for bonus in &self.bonuses {
            bonus.stat.parse::<Stat>().map_err(|stat| ScoringError::UnknownStat { stat })?;
            if !bonus.points.is_finite() || !bonus.threshold.is_finite() {
                return Err(ScoringError::InvalidValue {
                    stat: bonus.stat.clone(),
                    value: bonus.points,
                });
            }
        }

        let mut warnings = Vec::new();
        if self.multiplier(Stat::PassingTds) > 10.0 {
            warnings.push("Passing TD value seems unusually high".to_string());
        }
        if self.multiplier(Stat::Receptions) > 2.0 {
            warnings.push("Reception value seems unusually high for PPR".to_string());
        }
        for warning in &warnings {
            warn!("Scoring preset {}: {}", self.preset, warning);
        }

        Ok(warnings)
    }
}
