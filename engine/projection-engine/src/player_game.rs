//! Single-game box score sampling per position
//!
//! Every call draws one game's stat line from the position pipeline. The
//! simulator holds only priors; randomness comes from the caller's RNG so a
//! worker that owns a seeded stream gets reproducible games.

use fantasy_scoring::{Stat, StatLine};
use rand::Rng;
use rand_distr::{Binomial, Distribution, LogNormal, Normal, Poisson};
use tracing::trace;

use crate::config::{PositionPriors, ReceiverPriors};
use crate::error::{ProjectionError, Result};
use crate::models::{Position, ScheduledGame, TeamContext, UsagePriors};
use crate::OPPONENT_PIVOT;

/// Opponent multiplier: 1.0 is neutral, stronger defenses (< 1.0) raise it
pub fn opponent_multiplier(strength: f64) -> f64 {
    OPPONENT_PIVOT - strength
}

/// Poisson draw; rates that are zero, negative or non-finite yield 0
pub fn sample_poisson<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> Result<f64> {
    if !(lambda > 0.0) || !lambda.is_finite() {
        return Ok(0.0);
    }
    let poisson = Poisson::new(lambda).map_err(|e| ProjectionError::sampling("poisson", e))?;
    let draw: f64 = poisson.sample(rng);
    Ok(draw)
}

/// Binomial draw with `p` clamped into [0, 1]
pub fn sample_binomial<R: Rng + ?Sized>(rng: &mut R, trials: f64, p: f64) -> Result<f64> {
    let n = trials.max(0.0) as u64;
    if n == 0 {
        return Ok(0.0);
    }
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    let binomial = Binomial::new(n, p).map_err(|e| ProjectionError::sampling("binomial", e))?;
    Ok(binomial.sample(rng) as f64)
}

/// Log-normal draw parameterized by the underlying normal's `mu` and `sigma`
pub fn sample_lognormal<R: Rng + ?Sized>(rng: &mut R, mu: f64, sigma: f64) -> Result<f64> {
    if !(sigma >= 0.0) {
        return Err(ProjectionError::sampling("lognormal", format!("sigma {sigma} must be non-negative")));
    }
    let lognormal =
        LogNormal::new(mu, sigma).map_err(|e| ProjectionError::sampling("lognormal", e))?;
    Ok(lognormal.sample(rng))
}

/// Normal draw; a negative or NaN `std_dev` is a sampling error
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> Result<f64> {
    if !(std_dev >= 0.0) {
        return Err(ProjectionError::sampling("normal", format!("std_dev {std_dev} must be non-negative")));
    }
    let normal = Normal::new(mean, std_dev).map_err(|e| ProjectionError::sampling("normal", e))?;
    Ok(normal.sample(rng))
}

/// Opponent defensive ratings, 1.0 = average
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpponentStrength {
    pub rush: f64,
    pub pass: f64,
}

impl Default for OpponentStrength {
    fn default() -> Self {
        Self { rush: 1.0, pass: 1.0 }
    }
}

impl OpponentStrength {
    /// Ratings on a schedule entry, average where unset
    pub fn from_game(game: &ScheduledGame) -> Self {
        Self {
            rush: game.opp_rush_defense.unwrap_or(1.0),
            pass: game.opp_pass_defense.unwrap_or(1.0),
        }
    }

    pub fn of_team(team: &TeamContext) -> Self {
        Self { rush: team.rush_defense, pass: team.pass_defense }
    }
}

/// Stateless per-game sampler
#[derive(Debug, Clone, Default)]
pub struct PlayerGameSimulator {
    priors: PositionPriors,
}

impl PlayerGameSimulator {
    pub fn new(priors: PositionPriors) -> Self {
        Self { priors }
    }

    pub fn priors(&self) -> &PositionPriors {
        &self.priors
    }

    /// Quarterback game from expected team pass attempts
    pub fn simulate_qb_game<R: Rng + ?Sized>(
        &self,
        expected_attempts: f64,
        usage: &UsagePriors,
        opp_pass_defense: f64,
        rng: &mut R,
    ) -> Result<StatLine> {
        let qb = &self.priors.qb;
        let opp = opponent_multiplier(opp_pass_defense);

        let attempts = sample_poisson(rng, expected_attempts)?;
        if attempts == 0.0 {
            return Ok(StatLine::new());
        }

        let completion_rate = usage.completion_rate.unwrap_or_else(|| qb.completion_rate.mean());
        let completions = sample_binomial(rng, attempts, completion_rate * opp)?;

        let yards_mean = attempts * qb.yards_per_attempt.mu * opp;
        let passing_yards = if completions > 0.0 && yards_mean > 0.0 {
            sample_lognormal(rng, yards_mean.ln(), qb.yards_per_attempt.sigma / attempts.sqrt())?
        } else {
            0.0
        };

        let td_rate = qb.td_rate * usage.rz_share_boost.unwrap_or(1.0);
        let passing_tds = sample_poisson(rng, attempts * td_rate * opp)?;
        let interceptions = sample_poisson(rng, attempts * qb.int_rate * opp_pass_defense)?;

        let rushes =
            sample_poisson(rng, expected_attempts * qb.rush_share * qb.designed_run_factor)?;
        let (rushing_yards, rushing_tds) = if rushes > 0.0 {
            let yards = sample_normal(
                rng,
                rushes * qb.rush_yards_per_attempt,
                rushes * qb.rush_yards_sd_per_attempt,
            )?
            .max(qb.rush_yards_floor);
            (yards, sample_poisson(rng, rushes * qb.rush_td_rate)?)
        } else {
            (0.0, 0.0)
        };

        let two_point = sample_poisson(rng, qb.two_point_rate)?;

        Ok(StatLine::new()
            .with(Stat::PassAttempts, attempts)
            .with(Stat::Completions, completions)
            .with(Stat::PassingYards, passing_yards)
            .with(Stat::PassingTds, passing_tds)
            .with(Stat::Interceptions, interceptions)
            .with(Stat::RushAttempts, rushes)
            .with(Stat::RushingYards, rushing_yards)
            .with(Stat::RushingTds, rushing_tds)
            .with(Stat::TwoPointConversions, two_point))
    }

    /// Running back game from team carries and team pass attempts
    pub fn simulate_rb_game<R: Rng + ?Sized>(
        &self,
        team_carries: f64,
        team_pass_attempts: f64,
        usage: &UsagePriors,
        opponent: OpponentStrength,
        rng: &mut R,
    ) -> Result<StatLine> {
        let rb = &self.priors.rb;
        let defaults = self.priors.usage_defaults.for_position(Position::RB);
        let rush_opp = opponent_multiplier(opponent.rush);
        let pass_opp = opponent_multiplier(opponent.pass);

        let rush_share = self.rb_rush_share(usage);
        let target_share =
            usage.target_share.or(defaults.target_share).unwrap_or(rb.target_share.mean());

        let carries = sample_poisson(rng, team_carries * rush_share)?;
        let rushing_yards = if carries > 0.0 {
            sample_normal(
                rng,
                carries * rb.yards_per_carry.mu * rush_opp,
                carries.sqrt() * rb.yards_per_carry.sigma,
            )?
            .max(rb.rush_yards_floor)
        } else {
            0.0
        };

        let targets = sample_poisson(rng, team_pass_attempts * target_share)?;
        let catch_rate = usage.catch_rate.unwrap_or_else(|| rb.catch_rate.mean());
        let receptions = sample_binomial(rng, targets, catch_rate)?;
        let receiving_yards = if receptions > 0.0 {
            sample_normal(
                rng,
                receptions * rb.yards_per_reception.mu * pass_opp,
                receptions.sqrt() * rb.yards_per_reception.sigma,
            )?
            .max(0.0)
        } else {
            0.0
        };

        let rz_share = self.red_zone_share(Position::RB, usage);
        let rushing_tds = sample_poisson(rng, carries * rb.td_rate_rush * rz_share * rush_opp)?;
        let receiving_tds = sample_poisson(rng, targets * rb.td_rate_rec * pass_opp)?;
        let two_point = sample_poisson(rng, rb.two_point_rate)?;

        Ok(StatLine::new()
            .with(Stat::RushAttempts, carries)
            .with(Stat::RushingYards, rushing_yards)
            .with(Stat::RushingTds, rushing_tds)
            .with(Stat::Targets, targets)
            .with(Stat::Receptions, receptions)
            .with(Stat::ReceivingYards, receiving_yards)
            .with(Stat::ReceivingTds, receiving_tds)
            .with(Stat::TwoPointConversions, two_point))
    }

    /// Wide receiver or tight end game from team pass attempts
    pub fn simulate_receiver_game<R: Rng + ?Sized>(
        &self,
        position: Position,
        team_pass_attempts: f64,
        usage: &UsagePriors,
        opp_pass_defense: f64,
        rng: &mut R,
    ) -> Result<StatLine> {
        let priors = self.receiver_priors(position)?;
        let defaults = self.priors.usage_defaults.for_position(position);
        let opp = opponent_multiplier(opp_pass_defense);

        let target_share = self.receiver_target_share(position, priors, usage);
        let targets = sample_poisson(rng, team_pass_attempts * target_share)?;
        if targets == 0.0 {
            return Ok(StatLine::new());
        }

        let catch_rate =
            usage.catch_rate.or(defaults.catch_rate).unwrap_or(priors.catch_rate.mean());
        let adjusted_catch =
            (catch_rate * opp / priors.catch_rate_normalizer).min(priors.catch_rate_cap);
        let receptions = sample_binomial(rng, targets, adjusted_catch)?;
        if receptions == 0.0 {
            return Ok(StatLine::new().with(Stat::Targets, targets));
        }

        let adot = usage.adot.unwrap_or(priors.adot);
        let yards_mean = receptions * priors.yards_per_reception.mu * (adot / priors.adot) * opp;
        let receiving_yards = if yards_mean > 0.0 {
            sample_lognormal(
                rng,
                yards_mean.ln(),
                priors.yards_per_reception.sigma / receptions.sqrt(),
            )?
        } else {
            0.0
        };

        let rz_target_share = self.red_zone_share(position, usage);
        let receiving_tds = sample_poisson(rng, targets * priors.td_rate * rz_target_share * opp)?;

        let end_around = if rng.gen::<f64>() < priors.end_around_probability {
            sample_poisson(rng, priors.end_around_rate)?
        } else {
            0.0
        };
        let rushing_yards = if end_around > 0.0 {
            let per_carry =
                sample_normal(rng, priors.end_around_yards.mu, priors.end_around_yards.sigma)?;
            trace!("End-around for {position}: {end_around} carries, {per_carry:.1} yards each");
            (per_carry * end_around).max(priors.rush_yards_floor)
        } else {
            0.0
        };

        let two_point = sample_poisson(rng, priors.two_point_rate)?;

        Ok(StatLine::new()
            .with(Stat::Targets, targets)
            .with(Stat::Receptions, receptions)
            .with(Stat::ReceivingYards, receiving_yards)
            .with(Stat::ReceivingTds, receiving_tds)
            .with(Stat::RushAttempts, end_around)
            .with(Stat::RushingYards, rushing_yards)
            .with(Stat::TwoPointConversions, two_point))
    }

    /// Red-zone share driving touchdown rates
    ///
    /// An explicit share wins; otherwise it is derived from the player's rush
    /// share (RB) or target share (WR/TE). Quarterbacks have none.
    pub fn red_zone_share(&self, position: Position, usage: &UsagePriors) -> f64 {
        match position {
            Position::QB => 0.0,
            Position::RB => usage
                .rz_share
                .unwrap_or_else(|| self.rb_rush_share(usage) * self.priors.rb.rz_share_from_rush_share),
            Position::WR | Position::TE => {
                let priors = if position == Position::WR { &self.priors.wr } else { &self.priors.te };
                usage.rz_target_share.unwrap_or_else(|| {
                    self.receiver_target_share(position, priors, usage)
                        * priors.rz_target_share_from_target_share
                })
            }
        }
    }

    fn rb_rush_share(&self, usage: &UsagePriors) -> f64 {
        let defaults = self.priors.usage_defaults.for_position(Position::RB);
        usage.rush_share.or(defaults.rush_share).unwrap_or(self.priors.rb.rush_share.mean())
    }

    fn receiver_target_share(
        &self,
        position: Position,
        priors: &ReceiverPriors,
        usage: &UsagePriors,
    ) -> f64 {
        let defaults = self.priors.usage_defaults.for_position(position);
        usage.target_share.or(defaults.target_share).unwrap_or(priors.target_share.mean())
    }

    fn receiver_priors(&self, position: Position) -> Result<&ReceiverPriors> {
        match position {
            Position::WR => Ok(&self.priors.wr),
            Position::TE => Ok(&self.priors.te),
            other => Err(ProjectionError::invalid_config(format!(
                "{other} is not a receiving position"
            ))),
        }
    }
}
