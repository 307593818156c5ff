use crate::config::{AllowedBand, BonusScope, ScoringConfig};
use crate::error::ScoringError;
use crate::stats::{Stat, StatLine};
use tracing::debug;

/// Validated scoring rules compiled into a dense multiplier table
#[derive(Debug, Clone)]
pub struct ScoringSystem {
    config: ScoringConfig,
    multipliers: [f64; Stat::COUNT],
    /// Per stat, tiers sorted by descending threshold
    bonuses: Vec<(Stat, Vec<(f64, f64)>)>,
}

impl ScoringSystem {
    /// Validate and compile a scoring document
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;

        let mut multipliers = [0.0; Stat::COUNT];
        for stat in Stat::ALL {
            multipliers[stat.index()] = config.multiplier(stat);
        }

        let mut bonuses: Vec<(Stat, Vec<(f64, f64)>)> = Vec::new();
        for tier in &config.bonuses {
            let stat: Stat =
                tier.stat.parse().map_err(|stat| ScoringError::UnknownStat { stat })?;
            match bonuses.iter_mut().find(|(s, _)| *s == stat) {
                Some((_, tiers)) => tiers.push((tier.threshold, tier.points)),
                None => bonuses.push((stat, vec![(tier.threshold, tier.points)])),
            }
        }
        for (_, tiers) in bonuses.iter_mut() {
            tiers.sort_by(|a, b| b.0.total_cmp(&a.0));
        }

        debug!(
            "Compiled scoring preset {} ({} priced stats, {} bonus stats)",
            config.preset,
            multipliers.iter().filter(|m| **m != 0.0).count(),
            bonuses.len()
        );

        Ok(Self { config, multipliers, bonuses })
    }

    /// Compile a named preset
    pub fn from_preset(name: &str) -> Result<Self, ScoringError> {
        Self::new(ScoringConfig::preset(name)?)
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn bonus_scope(&self) -> BonusScope {
        self.config.bonus_scope
    }

    /// Total fantasy points for a line, bonuses included
    pub fn points(&self, stats: &StatLine) -> f64 {
        self.base_points(stats) + self.bonus_points(stats)
    }

    /// Linear stat points plus defense bands, no milestone bonuses
    pub fn base_points(&self, stats: &StatLine) -> f64 {
        let linear: f64 =
            stats.values().iter().zip(self.multipliers.iter()).map(|(v, m)| v * m).sum();

        let bands = match stats.allowed {
            Some(allowed) => {
                band_points(&self.config.points_allowed_bands, allowed.points_allowed)
                    + band_points(&self.config.yards_allowed_bands, allowed.yards_allowed)
            }
            None => 0.0,
        };

        linear + bands
    }

    /// Milestone bonuses: highest tier reached per stat, not cumulative
    pub fn bonus_points(&self, stats: &StatLine) -> f64 {
        self.bonuses
            .iter()
            .filter_map(|(stat, tiers)| {
                let value = stats.get(*stat);
                tiers.iter().find(|(threshold, _)| value >= *threshold).map(|(_, pts)| *pts)
            })
            .sum()
    }
}

fn band_points(bands: &[AllowedBand], value: f64) -> f64 {
    bands
        .iter()
        .find(|band| band.below.map_or(true, |below| value < below))
        .map(|band| band.points)
        .unwrap_or(0.0)
}

/// Points for a line under a scoring document, rounded to two decimals
pub fn calc_points(stats: &StatLine, config: &ScoringConfig) -> Result<f64, ScoringError> {
    let system = ScoringSystem::new(config.clone())?;
    Ok((system.points(stats) * 100.0).round() / 100.0)
}
