//! Configuration for the projection engine

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ProjectionError, Result};
use crate::models::{Position, UsagePriors};
use crate::{DEFAULT_LEAGUE_SIZE, DEFAULT_N_SIMS, TIER_OVERLAP_THRESHOLD};

/// Configuration for a projection run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Realization count, worker pool and seeding
    pub simulation: SimulationParameters,

    /// Game-level expectation constants
    pub game: GameParameters,

    /// Shrinkage weights and depth chart multipliers
    pub shrinkage: ShrinkageParameters,

    /// Per-position sampling priors
    pub priors: PositionPriors,

    /// Replacement ranks and tiering
    pub draft: DraftParameters,

    /// Log level and output format
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Season realizations per player
    pub n_sims: usize,

    /// Worker threads; defaults to available cores minus one
    pub worker_threads: Option<usize>,

    /// Base seed for reproducible runs; each player derives its own stream
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameParameters {
    /// Symmetric home-field pace multiplier (home × (1+h), away × (1-h))
    pub home_field_advantage: f64,

    /// Game total at which pace is unscaled
    pub baseline_total: f64,

    /// Log-odds shift per unit of (pass defense - rush defense)
    pub defense_mix_sensitivity: f64,

    /// Log-odds shift per point of expected margin
    pub game_script_sensitivity: f64,

    /// Fraction of pass plays ending in a sack
    pub sack_rate: f64,

    /// Points per scoring drive when converting team totals to touchdowns
    pub points_per_touchdown: f64,

    /// Share of red-zone trips that end in a touchdown
    pub red_zone_td_rate: f64,

    pub plays_per_red_zone_trip: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkageParameters {
    /// Weight on the conference mean in [0, 1]
    pub conference_weight: f64,

    /// Share boost at 100% returning production
    pub returning_production_boost: f64,

    pub starter_multiplier: f64,
    pub backup_multiplier: f64,
    pub third_string_multiplier: f64,

    /// Extra multiplier for first-year starters at WR
    pub first_year_wr_discount: f64,
}

/// Beta(alpha, beta) prior on a rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPrior {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPrior {
    pub const fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }
}

/// Per-unit yardage prior: `mu` yards with dispersion `sigma`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YardagePrior {
    pub mu: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QbPriors {
    pub completion_rate: BetaPrior,
    /// Log-normal sigma is `sigma / sqrt(attempts)`
    pub yards_per_attempt: YardagePrior,
    pub td_rate: f64,
    pub int_rate: f64,
    /// Designed runs and scrambles per expected pass attempt
    pub rush_share: f64,
    pub designed_run_factor: f64,
    pub rush_yards_per_attempt: f64,
    pub rush_yards_sd_per_attempt: f64,
    /// Floor on total rushing yards (sack yardage)
    pub rush_yards_floor: f64,
    pub rush_td_rate: f64,
    pub two_point_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RbPriors {
    pub rush_share: BetaPrior,
    pub target_share: BetaPrior,
    pub red_zone_share: BetaPrior,
    /// Normal per-carry mean and standard deviation
    pub yards_per_carry: YardagePrior,
    pub rush_yards_floor: f64,
    pub catch_rate: BetaPrior,
    /// Normal per-reception mean and standard deviation
    pub yards_per_reception: YardagePrior,
    pub td_rate_rush: f64,
    pub td_rate_rec: f64,
    /// Red-zone share assumed as a multiple of rush share when unset
    pub rz_share_from_rush_share: f64,
    pub two_point_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverPriors {
    pub target_share: BetaPrior,
    pub catch_rate: BetaPrior,
    pub red_zone_share: BetaPrior,
    /// Log-normal sigma is `sigma / sqrt(receptions)`
    pub yards_per_reception: YardagePrior,
    /// Position baseline average depth of target
    pub adot: f64,
    pub td_rate: f64,
    /// Divisor applied after the opponent adjustment to the catch rate
    pub catch_rate_normalizer: f64,
    pub catch_rate_cap: f64,
    /// Red-zone target share assumed as a multiple of target share when unset
    pub rz_target_share_from_target_share: f64,
    pub end_around_probability: f64,
    pub end_around_rate: f64,
    pub end_around_yards: YardagePrior,
    pub rush_yards_floor: f64,
    pub two_point_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionPriors {
    pub qb: QbPriors,
    pub rb: RbPriors,
    pub wr: ReceiverPriors,
    pub te: ReceiverPriors,

    /// Usage assumed for players with neither explicit usage nor history
    pub usage_defaults: UsageDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageDefaults {
    pub qb: UsagePriors,
    pub rb: UsagePriors,
    pub wr: UsagePriors,
    pub te: UsagePriors,
}

impl UsageDefaults {
    pub fn for_position(&self, position: Position) -> &UsagePriors {
        match position {
            Position::QB => &self.qb,
            Position::RB => &self.rb,
            Position::WR => &self.wr,
            Position::TE => &self.te,
        }
    }
}

/// 12-team replacement ranks, scaled linearly with league size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementRanks {
    pub qb: usize,
    pub rb: usize,
    pub wr: usize,
    pub te: usize,
}

impl ReplacementRanks {
    pub fn for_position(&self, position: Position) -> usize {
        match position {
            Position::QB => self.qb,
            Position::RB => self.rb,
            Position::WR => self.wr,
            Position::TE => self.te,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftParameters {
    pub league_size: usize,
    pub replacement_ranks: ReplacementRanks,
    /// Replacement level when the pool is thinner than the replacement rank,
    /// as a fraction of the last player's mean
    pub thin_pool_factor: f64,
    /// A player joins the current tier when p75 >= threshold × tier floor
    pub tier_overlap_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "compact", "pretty" or "json"
    pub format: String,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self { n_sims: DEFAULT_N_SIMS, worker_threads: None, seed: None }
    }
}

impl Default for GameParameters {
    fn default() -> Self {
        Self {
            home_field_advantage: 0.02,
            baseline_total: 50.0,
            defense_mix_sensitivity: 0.5,
            game_script_sensitivity: 0.02,
            sack_rate: 0.065,
            points_per_touchdown: 7.0,
            red_zone_td_rate: 0.55,
            plays_per_red_zone_trip: 3.5,
        }
    }
}

impl Default for ShrinkageParameters {
    fn default() -> Self {
        Self {
            conference_weight: 0.3,
            returning_production_boost: 0.15,
            starter_multiplier: 1.0,
            backup_multiplier: 0.35,
            third_string_multiplier: 0.10,
            first_year_wr_discount: 0.90,
        }
    }
}

impl Default for QbPriors {
    fn default() -> Self {
        Self {
            completion_rate: BetaPrior::new(62.0, 38.0),
            yards_per_attempt: YardagePrior { mu: 7.2, sigma: 1.8 },
            td_rate: 0.045,
            int_rate: 0.025,
            rush_share: 0.12,
            designed_run_factor: 0.8,
            rush_yards_per_attempt: 4.5,
            rush_yards_sd_per_attempt: 3.5,
            rush_yards_floor: -10.0,
            rush_td_rate: 0.08,
            two_point_rate: 0.02,
        }
    }
}

impl Default for RbPriors {
    fn default() -> Self {
        Self {
            rush_share: BetaPrior::new(5.0, 15.0),
            target_share: BetaPrior::new(2.0, 18.0),
            red_zone_share: BetaPrior::new(3.0, 7.0),
            yards_per_carry: YardagePrior { mu: 4.4, sigma: 4.5 },
            rush_yards_floor: -5.0,
            catch_rate: BetaPrior::new(75.0, 25.0),
            yards_per_reception: YardagePrior { mu: 7.0, sigma: 4.0 },
            td_rate_rush: 0.11,
            td_rate_rec: 0.04,
            rz_share_from_rush_share: 1.2,
            two_point_rate: 0.01,
        }
    }
}

impl ReceiverPriors {
    fn wide_receiver() -> Self {
        Self {
            target_share: BetaPrior::new(4.0, 16.0),
            catch_rate: BetaPrior::new(65.0, 35.0),
            red_zone_share: BetaPrior::new(3.0, 17.0),
            yards_per_reception: YardagePrior { mu: 12.5, sigma: 0.9 },
            adot: 10.5,
            td_rate: 0.4,
            catch_rate_normalizer: 1.5,
            catch_rate_cap: 0.95,
            rz_target_share_from_target_share: 0.8,
            end_around_probability: 0.05,
            end_around_rate: 0.1,
            end_around_yards: YardagePrior { mu: 8.0, sigma: 5.0 },
            rush_yards_floor: -5.0,
            two_point_rate: 0.005,
        }
    }

    fn tight_end() -> Self {
        Self {
            target_share: BetaPrior::new(3.0, 17.0),
            catch_rate: BetaPrior::new(70.0, 30.0),
            red_zone_share: BetaPrior::new(12.0, 88.0),
            yards_per_reception: YardagePrior { mu: 10.5, sigma: 0.8 },
            adot: 8.5,
            td_rate: 0.45,
            ..Self::wide_receiver()
        }
    }
}

impl Default for ReceiverPriors {
    fn default() -> Self {
        Self::wide_receiver()
    }
}

impl Default for PositionPriors {
    fn default() -> Self {
        Self {
            qb: QbPriors::default(),
            rb: RbPriors::default(),
            wr: ReceiverPriors::wide_receiver(),
            te: ReceiverPriors::tight_end(),
            usage_defaults: UsageDefaults::default(),
        }
    }
}

impl Default for UsageDefaults {
    fn default() -> Self {
        Self {
            qb: UsagePriors {
                completion_rate: Some(0.65),
                rz_share_boost: Some(1.0),
                ..Default::default()
            },
            rb: UsagePriors {
                rush_share: Some(0.25),
                target_share: Some(0.10),
                rz_share: Some(0.30),
                ..Default::default()
            },
            wr: UsagePriors {
                target_share: Some(0.20),
                catch_rate: Some(0.65),
                adot: Some(10.5),
                rz_target_share: Some(0.15),
                ..Default::default()
            },
            te: UsagePriors {
                target_share: Some(0.15),
                catch_rate: Some(0.70),
                adot: Some(8.5),
                rz_target_share: Some(0.12),
                ..Default::default()
            },
        }
    }
}

impl Default for ReplacementRanks {
    fn default() -> Self {
        Self { qb: 13, rb: 30, wr: 36, te: 13 }
    }
}

impl Default for DraftParameters {
    fn default() -> Self {
        Self {
            league_size: DEFAULT_LEAGUE_SIZE,
            replacement_ranks: ReplacementRanks::default(),
            thin_pool_factor: 0.8,
            tier_overlap_threshold: TIER_OVERLAP_THRESHOLD,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

impl SimulationParameters {
    /// Worker pool size: configured value, else available cores minus one
    pub fn worker_count(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| num_cpus::get().saturating_sub(1)).max(1)
    }
}

fn env_override<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ProjectionError::invalid_config(format!("{name}={raw} is not valid"))),
        Err(_) => Ok(None),
    }
}

impl ProjectionConfig {
    /// Defaults overridden by `PROJ_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `PROJ_*` environment overrides on top of this config
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(n_sims) = env_override("PROJ_N_SIMS")? {
            self.simulation.n_sims = n_sims;
        }
        if let Some(workers) = env_override("PROJ_WORKERS")? {
            self.simulation.worker_threads = Some(workers);
        }
        if let Some(seed) = env_override("PROJ_SEED")? {
            self.simulation.seed = Some(seed);
        }
        if let Some(league_size) = env_override("PROJ_LEAGUE_SIZE")? {
            self.draft.league_size = league_size;
        }
        if let Some(level) = env_override::<String>("PROJ_LOG_LEVEL")? {
            self.logging.level = level;
        }
        if let Some(format) = env_override::<String>("PROJ_LOG_FORMAT")? {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProjectionConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would make sampling or ranking meaningless
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(ProjectionError::invalid_config(message));

        if self.simulation.n_sims == 0 {
            return fail("simulation.n_sims must be at least 1".to_string());
        }
        if self.simulation.worker_threads == Some(0) {
            return fail("simulation.worker_threads must be at least 1".to_string());
        }
        if self.draft.league_size == 0 {
            return fail("draft.league_size must be at least 1".to_string());
        }

        let game = &self.game;
        if !(0.0..1.0).contains(&game.home_field_advantage) {
            return fail(format!(
                "game.home_field_advantage {} must be in [0, 1)",
                game.home_field_advantage
            ));
        }
        if !(game.baseline_total > 0.0) {
            return fail("game.baseline_total must be positive".to_string());
        }
        if !(0.0..1.0).contains(&game.sack_rate) {
            return fail(format!("game.sack_rate {} must be in [0, 1)", game.sack_rate));
        }
        if !(game.points_per_touchdown > 0.0) {
            return fail("game.points_per_touchdown must be positive".to_string());
        }
        if !(game.red_zone_td_rate > 0.0 && game.red_zone_td_rate <= 1.0) {
            return fail("game.red_zone_td_rate must be in (0, 1]".to_string());
        }

        if !(0.0..=1.0).contains(&self.shrinkage.conference_weight) {
            return fail("shrinkage.conference_weight must be in [0, 1]".to_string());
        }

        let threshold = self.draft.tier_overlap_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return fail(format!("draft.tier_overlap_threshold {threshold} must be in (0, 1]"));
        }

        let priors = &self.priors;
        let beta_priors = [
            ("priors.qb.completion_rate", priors.qb.completion_rate),
            ("priors.rb.rush_share", priors.rb.rush_share),
            ("priors.rb.target_share", priors.rb.target_share),
            ("priors.rb.red_zone_share", priors.rb.red_zone_share),
            ("priors.rb.catch_rate", priors.rb.catch_rate),
            ("priors.wr.target_share", priors.wr.target_share),
            ("priors.wr.catch_rate", priors.wr.catch_rate),
            ("priors.wr.red_zone_share", priors.wr.red_zone_share),
            ("priors.te.target_share", priors.te.target_share),
            ("priors.te.catch_rate", priors.te.catch_rate),
            ("priors.te.red_zone_share", priors.te.red_zone_share),
        ];
        for (name, prior) in beta_priors {
            if !(prior.alpha > 0.0 && prior.beta > 0.0) {
                return fail(format!("{name} needs positive alpha and beta"));
            }
        }

        let sigmas = [
            ("priors.qb.yards_per_attempt.sigma", priors.qb.yards_per_attempt.sigma),
            ("priors.qb.rush_yards_sd_per_attempt", priors.qb.rush_yards_sd_per_attempt),
            ("priors.rb.yards_per_carry.sigma", priors.rb.yards_per_carry.sigma),
            ("priors.rb.yards_per_reception.sigma", priors.rb.yards_per_reception.sigma),
            ("priors.wr.yards_per_reception.sigma", priors.wr.yards_per_reception.sigma),
            ("priors.wr.end_around_yards.sigma", priors.wr.end_around_yards.sigma),
            ("priors.te.yards_per_reception.sigma", priors.te.yards_per_reception.sigma),
            ("priors.te.end_around_yards.sigma", priors.te.end_around_yards.sigma),
        ];
        for (name, sigma) in sigmas {
            if !(sigma >= 0.0 && sigma.is_finite()) {
                return fail(format!("{name} {sigma} must be finite and non-negative"));
            }
        }

        for (name, receiver) in [("wr", &priors.wr), ("te", &priors.te)] {
            if !(receiver.adot > 0.0) {
                return fail(format!("priors.{name}.adot must be positive"));
            }
            if !(receiver.catch_rate_normalizer > 0.0) {
                return fail(format!("priors.{name}.catch_rate_normalizer must be positive"));
            }
        }

        Ok(())
    }
}
