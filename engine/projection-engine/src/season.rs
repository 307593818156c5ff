//! Season realizations, scoring and summary distributions
//!
//! The simulator walks a player's schedule `n_sims` times, samples every game,
//! scores each season total and summarizes the totals. Batches of players are
//! spread over a dedicated rayon pool, one player per task, with each task
//! owning its RNG.

use fantasy_scoring::{BonusScope, ScoringSystem, StatLine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ProjectionConfig;
use crate::error::{ProjectionError, Result, SimulationFailure};
use crate::game_expectation::GameExpectation;
use crate::models::{PlayerInfo, Position, ScheduledGame, SeasonDistribution, TeamContext, UsagePriors};
use crate::player_game::{OpponentStrength, PlayerGameSimulator};
use crate::seeding::StreamSeeder;
use crate::shrinkage::RateShrinkage;

/// Percentile levels reported for every distribution
pub const PERCENTILES: [f64; 7] = [10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0];

/// Summary statistics over season fantasy-point totals
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeasonSummary {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Values at [`PERCENTILES`]
    pub percentiles: [f64; 7],
}

/// Linear-interpolated percentile of sorted values, `q` in [0, 100]
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    (sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)).min(sorted[hi])
}

/// Mean, spread and percentiles of season totals; all zero for no totals
pub fn summarize(totals: &[f64]) -> SeasonSummary {
    if totals.is_empty() {
        return SeasonSummary::default();
    }

    let mut sorted = totals.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

    let mut percentiles = [0.0; 7];
    for (slot, q) in percentiles.iter_mut().zip(PERCENTILES) {
        *slot = percentile(&sorted, q);
    }

    SeasonSummary {
        mean,
        std: variance.sqrt(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        percentiles,
    }
}

impl SeasonDistribution {
    pub fn from_summary(player: &PlayerInfo, games: usize, summary: &SeasonSummary) -> Self {
        let [p10, p25, p50, p75, p90, p95, p99] = summary.percentiles;
        Self {
            player_id: player.player_id.clone(),
            name: player.name.clone(),
            position: player.position,
            team: player.team.clone(),
            games,
            mean: summary.mean,
            std: summary.std,
            min: summary.min,
            max: summary.max,
            p10,
            p25,
            p50,
            p75,
            p90,
            p95,
            p99,
        }
    }
}

/// Distributions for every player that simulated cleanly, plus the failures
#[derive(Debug, Clone, Default)]
pub struct SimulationBatch {
    pub distributions: Vec<SeasonDistribution>,
    pub failures: Vec<SimulationFailure>,
}

/// Monte Carlo season simulator
#[derive(Debug, Clone)]
pub struct SeasonSimulator {
    config: ProjectionConfig,
    scoring: ScoringSystem,
    shrinkage: RateShrinkage,
    expectation: GameExpectation,
    game_sim: PlayerGameSimulator,
}

impl SeasonSimulator {
    /// Validates the configuration before anything is simulated
    pub fn new(config: ProjectionConfig, scoring: ScoringSystem) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            shrinkage: RateShrinkage::new(config.shrinkage.clone(), config.priors.clone()),
            expectation: GameExpectation::new(config.game.clone()),
            game_sim: PlayerGameSimulator::new(config.priors.clone()),
            config,
            scoring,
        })
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn scoring(&self) -> &ScoringSystem {
        &self.scoring
    }

    pub fn shrinkage(&self) -> &RateShrinkage {
        &self.shrinkage
    }

    pub fn expectation(&self) -> &GameExpectation {
        &self.expectation
    }

    /// Sample one game's stat line for a player
    pub fn simulate_game<R: Rng + ?Sized>(
        &self,
        position: Position,
        team: &TeamContext,
        usage: &UsagePriors,
        game: &ScheduledGame,
        rng: &mut R,
    ) -> Result<StatLine> {
        let (home_pace, away_pace) =
            if game.is_home { (team.pace, game.opp_pace) } else { (game.opp_pace, team.pace) };
        let plays =
            self.expectation.expected_plays(home_pace, away_pace, game.vegas_total, game.is_home);

        let opponent = OpponentStrength::from_game(game);
        let (pass_rate, _) = self.expectation.expected_mix(
            team.pass_rate,
            opponent.pass,
            opponent.rush,
            self.expectation.game_script(game),
        );
        let attempts = self.expectation.calculate_team_attempts(plays, pass_rate);

        match position {
            Position::QB => {
                self.game_sim.simulate_qb_game(attempts.pass_attempts, usage, opponent.pass, rng)
            }
            Position::RB => self.game_sim.simulate_rb_game(
                attempts.rush_attempts,
                attempts.pass_attempts,
                usage,
                opponent,
                rng,
            ),
            Position::WR | Position::TE => self.game_sim.simulate_receiver_game(
                position,
                attempts.pass_attempts,
                usage,
                opponent.pass,
                rng,
            ),
        }
    }

    /// Season fantasy-point totals, one per realization
    pub fn season_totals<R: Rng + ?Sized>(
        &self,
        player: &PlayerInfo,
        schedule: &[ScheduledGame],
        usage: &UsagePriors,
        n_sims: usize,
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        validate_schedule(&player.team, schedule)?;

        let mut ordered: Vec<&ScheduledGame> = schedule.iter().collect();
        ordered.sort_by_key(|game| game.week);

        let team = self.shrinkage.resolve_team(&player.team_context);
        let per_game_bonuses = self.scoring.bonus_scope() == BonusScope::Game;

        let mut totals = Vec::with_capacity(n_sims);
        for _ in 0..n_sims {
            let mut season = StatLine::new();
            let mut game_bonuses = 0.0;

            for game in ordered.iter().filter(|game| !game.is_missed_by(&player.player_id)) {
                let line = self.simulate_game(player.position, &team, usage, game, rng)?;
                if per_game_bonuses {
                    game_bonuses += self.scoring.bonus_points(&line);
                }
                season += &line;
            }

            let points = if per_game_bonuses {
                self.scoring.base_points(&season) + game_bonuses
            } else {
                self.scoring.points(&season)
            };
            totals.push(points);
        }

        Ok(totals)
    }

    /// Simulate one player's season `n_sims` times and summarize
    pub fn simulate_season<R: Rng + ?Sized>(
        &self,
        player: &PlayerInfo,
        schedule: &[ScheduledGame],
        usage: &UsagePriors,
        n_sims: usize,
        rng: &mut R,
    ) -> Result<SeasonDistribution> {
        let totals = self.season_totals(player, schedule, usage, n_sims, rng)?;
        let summary = summarize(&totals);

        debug!(
            "Simulated {} ({}) over {} games: mean {:.1}, p10 {:.1}, p90 {:.1}",
            player.player_id,
            player.position,
            schedule.len(),
            summary.mean,
            summary.percentiles[0],
            summary.percentiles[4]
        );

        Ok(SeasonDistribution::from_summary(player, schedule.len(), &summary))
    }

    /// Resolve usage, seed a stream and simulate one player
    pub fn simulate_player(
        &self,
        player: &PlayerInfo,
        schedule: &[ScheduledGame],
    ) -> Result<SeasonDistribution> {
        let usage = self.shrinkage.resolve_usage(player);
        let mut rng = match self.config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(StreamSeeder::worker_seed(seed, &player.player_id)),
            None => StdRng::from_entropy(),
        };
        self.simulate_season(player, schedule, &usage, self.config.simulation.n_sims, &mut rng)
    }

    /// Simulate every player on a dedicated worker pool
    ///
    /// A player whose simulation errors or panics is logged and reported as a
    /// failure; the rest of the batch is unaffected. Distributions come back in
    /// input order.
    pub fn simulate_players(
        &self,
        players: &[PlayerInfo],
        schedules: &BTreeMap<String, Vec<ScheduledGame>>,
    ) -> Result<SimulationBatch> {
        let workers = self.config.simulation.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sim-worker-{i}"))
            .build()?;

        info!(
            "Simulating {} players x {} seasons on {} workers",
            players.len(),
            self.config.simulation.n_sims,
            workers
        );
        let start = Instant::now();
        let defenses = team_defenses(players);

        let results: Vec<std::result::Result<SeasonDistribution, SimulationFailure>> =
            pool.install(|| {
                players
                    .par_iter()
                    .map(|player| {
                        let schedule = match schedules.get(&player.team) {
                            Some(schedule) => with_opponent_defenses(schedule, &defenses),
                            None => {
                                warn!(
                                    "No schedule for team {} ({}), projecting zero games",
                                    player.team, player.player_id
                                );
                                Vec::new()
                            }
                        };
                        self.isolated(player, &schedule)
                    })
                    .collect()
            });

        let mut batch = SimulationBatch::default();
        for result in results {
            match result {
                Ok(distribution) => batch.distributions.push(distribution),
                Err(failure) => batch.failures.push(failure),
            }
        }

        info!(
            "Simulation finished in {:.2?}: {} projected, {} failed",
            start.elapsed(),
            batch.distributions.len(),
            batch.failures.len()
        );

        Ok(batch)
    }

    fn isolated(
        &self,
        player: &PlayerInfo,
        schedule: &[ScheduledGame],
    ) -> std::result::Result<SeasonDistribution, SimulationFailure> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.simulate_player(player, schedule)));

        let reason = match outcome {
            Ok(Ok(distribution)) => return Ok(distribution),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => {
                if let Some(message) = payload.downcast_ref::<&str>() {
                    format!("panicked: {message}")
                } else if let Some(message) = payload.downcast_ref::<String>() {
                    format!("panicked: {message}")
                } else {
                    "panicked".to_string()
                }
            }
        };

        error!("Simulation failed for player {}: {}", player.player_id, reason);
        Err(SimulationFailure { player_id: player.player_id.clone(), reason })
    }
}

/// Defensive ratings per team, from the first roster entry's team context
pub fn team_defenses(players: &[PlayerInfo]) -> BTreeMap<&str, OpponentStrength> {
    let mut defenses = BTreeMap::new();
    for player in players {
        defenses
            .entry(player.team.as_str())
            .or_insert_with(|| OpponentStrength::of_team(&player.team_context));
    }
    defenses
}

/// Copy of a schedule with unset opponent ratings filled from known teams
pub fn with_opponent_defenses(
    schedule: &[ScheduledGame],
    defenses: &BTreeMap<&str, OpponentStrength>,
) -> Vec<ScheduledGame> {
    schedule
        .iter()
        .map(|game| {
            let mut game = game.clone();
            if let Some(defense) = defenses.get(game.opponent.as_str()) {
                game.opp_pass_defense = game.opp_pass_defense.or(Some(defense.pass));
                game.opp_rush_defense = game.opp_rush_defense.or(Some(defense.rush));
            }
            game
        })
        .collect()
}

fn validate_schedule(team: &str, schedule: &[ScheduledGame]) -> Result<()> {
    for game in schedule {
        let reason = if !game.vegas_total.is_finite() {
            Some(format!("vegas_total {} is not finite", game.vegas_total))
        } else if !(game.opp_pace > 0.0 && game.opp_pace.is_finite()) {
            Some(format!("opp_pace {} must be positive", game.opp_pace))
        } else if let Some(rating) = [game.opp_pass_defense, game.opp_rush_defense]
            .into_iter()
            .flatten()
            .find(|rating| !rating.is_finite())
        {
            Some(format!("opponent defense rating {rating} is not finite"))
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(ProjectionError::UnsupportedSchedule {
                team: team.to_string(),
                week: game.week,
                reason,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantasy_scoring::{BonusTier, ScoringConfig, Stat};
    use std::collections::BTreeSet;

    fn simulator(seed: u64) -> SeasonSimulator {
        let mut config = ProjectionConfig::default();
        config.simulation.seed = Some(seed);
        config.simulation.n_sims = 200;
        config.simulation.worker_threads = Some(2);
        SeasonSimulator::new(config, ScoringSystem::from_preset("ppr").unwrap()).unwrap()
    }

    fn receiver(id: &str, target_share: f64) -> PlayerInfo {
        PlayerInfo {
            player_id: id.to_string(),
            name: format!("Receiver {id}"),
            position: Position::WR,
            team: "TEX".to_string(),
            team_context: TeamContext::default(),
            usage: Some(UsagePriors { target_share: Some(target_share), ..Default::default() }),
            history: None,
            depth: None,
        }
    }

    fn schedule(weeks: u32) -> Vec<ScheduledGame> {
        (1..=weeks)
            .map(|week| ScheduledGame {
                week,
                is_home: week % 2 == 1,
                opponent: format!("OPP{week}"),
                vegas_total: 55.0,
                spread: Some(-3.0),
                implied_team_total: None,
                opp_pace: 70.0,
                opp_pass_defense: None,
                opp_rush_defense: None,
                game_script: None,
                inactive: BTreeSet::new(),
            })
            .collect()
    }

    #[test]
    fn test_summarize_empty_is_zero() {
        assert_eq!(summarize(&[]), SeasonSummary::default());
    }

    #[test]
    fn test_summarize_matches_linear_interpolation() {
        let totals: Vec<f64> = (1..=5).map(|x| x as f64 * 10.0).collect();
        let summary = summarize(&totals);

        assert_eq!(summary.mean, 30.0);
        assert!((summary.std - 200.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 50.0);
        // p10 sits 0.4 of the way from 10 to 20
        assert!((summary.percentiles[0] - 14.0).abs() < 1e-12);
        assert_eq!(summary.percentiles[2], 30.0);
        assert!((summary.percentiles[6] - 49.6).abs() < 1e-12);
    }

    #[test]
    fn test_summarize_single_value() {
        let summary = summarize(&[12.5]);
        assert_eq!(summary.mean, 12.5);
        assert_eq!(summary.std, 0.0);
        assert!(summary.percentiles.iter().all(|p| *p == 12.5));
    }

    #[test]
    fn test_empty_schedule_is_all_zero() {
        let simulator = simulator(1);
        let distribution = simulator.simulate_player(&receiver("WR1", 0.25), &[]).unwrap();

        assert_eq!(distribution.games, 0);
        assert_eq!(distribution.mean, 0.0);
        assert_eq!(distribution.min, 0.0);
        assert_eq!(distribution.max, 0.0);
        assert!(distribution.percentiles().iter().all(|p| *p == 0.0));
    }

    #[test]
    fn test_missed_games_are_skipped() {
        let simulator = simulator(5);
        let mut games = schedule(4);
        for game in games.iter_mut() {
            game.inactive.insert("WR1".to_string());
        }

        let distribution = simulator.simulate_player(&receiver("WR1", 0.25), &games).unwrap();
        assert_eq!(distribution.games, 4);
        assert_eq!(distribution.max, 0.0);
    }

    #[test]
    fn test_seeded_player_is_reproducible() {
        let player = receiver("WR1", 0.22);
        let games = schedule(12);

        let first = simulator(99).simulate_player(&player, &games).unwrap();
        let second = simulator(99).simulate_player(&player, &games).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unsupported_schedule_is_rejected() {
        let simulator = simulator(3);
        let mut games = schedule(3);
        games[1].vegas_total = f64::NAN;

        let err = simulator.simulate_player(&receiver("WR1", 0.2), &games).unwrap_err();
        assert!(matches!(err, ProjectionError::UnsupportedSchedule { week: 2, .. }));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let simulator = simulator(11);
        let players = vec![receiver("WR1", 0.25), receiver("WR2", 0.1)];

        let mut bad = receiver("WR3", 0.2);
        bad.team = "BAD".to_string();
        let mut players_with_bad = players.clone();
        players_with_bad.insert(1, bad);

        let mut schedules = BTreeMap::new();
        schedules.insert("TEX".to_string(), schedule(6));
        let mut broken = schedule(6);
        broken[0].opp_pace = -1.0;
        schedules.insert("BAD".to_string(), broken);

        let batch = simulator.simulate_players(&players_with_bad, &schedules).unwrap();
        assert_eq!(batch.distributions.len(), 2);
        assert_eq!(batch.distributions[0].player_id, "WR1");
        assert_eq!(batch.distributions[1].player_id, "WR2");
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].player_id, "WR3");
    }

    #[test]
    fn test_missing_team_schedule_projects_zero() {
        let simulator = simulator(4);
        let batch = simulator.simulate_players(&[receiver("WR1", 0.25)], &BTreeMap::new()).unwrap();
        assert_eq!(batch.distributions.len(), 1);
        assert_eq!(batch.distributions[0].mean, 0.0);
    }

    #[test]
    fn test_game_bonus_scope_pays_per_game() {
        let mut scoring = ScoringConfig::preset("ppr").unwrap();
        scoring.bonuses = vec![BonusTier {
            stat: Stat::ReceivingYards.key().to_string(),
            threshold: 1.0,
            points: 100.0,
        }];
        let season_scope = ScoringSystem::new(scoring.clone()).unwrap();
        scoring.bonus_scope = BonusScope::Game;
        let game_scope = ScoringSystem::new(scoring).unwrap();

        let mut config = ProjectionConfig::default();
        config.simulation.seed = Some(8);
        config.simulation.n_sims = 100;
        let player = receiver("WR1", 0.3);
        let games = schedule(10);

        let season = SeasonSimulator::new(config.clone(), season_scope)
            .unwrap()
            .simulate_player(&player, &games)
            .unwrap();
        let per_game = SeasonSimulator::new(config, game_scope)
            .unwrap()
            .simulate_player(&player, &games)
            .unwrap();

        // Same seed, same stat lines: only the bonus accounting differs
        assert!(per_game.mean > season.mean + 100.0);
    }

    #[test]
    fn test_opponent_ratings_fall_back_to_team_context() {
        let mut stout = receiver("WR9", 0.2);
        stout.team = "OPP2".to_string();
        stout.team_context.pass_defense = 0.8;
        stout.team_context.rush_defense = 0.9;
        let players = vec![receiver("WR1", 0.2), stout];

        let mut games = schedule(3);
        games[2].opponent = "OPP2".to_string();
        games[2].opp_pass_defense = Some(1.3);
        games[1].opponent = "OPP2".to_string();

        let defenses = team_defenses(&players);
        assert_eq!(defenses.len(), 2);
        let resolved = with_opponent_defenses(&games, &defenses);

        // Unknown opponent stays average
        assert_eq!(OpponentStrength::from_game(&resolved[0]), OpponentStrength::default());
        assert_eq!(resolved[1].opp_pass_defense, Some(0.8));
        assert_eq!(resolved[1].opp_rush_defense, Some(0.9));
        // Explicit ratings win
        assert_eq!(resolved[2].opp_pass_defense, Some(1.3));
        assert_eq!(resolved[2].opp_rush_defense, Some(0.9));
    }

    #[test]
    fn test_non_finite_defense_is_rejected() {
        let simulator = simulator(6);
        let mut games = schedule(4);
        games[1].opp_rush_defense = Some(f64::NAN);

        let err = simulator.simulate_player(&receiver("WR1", 0.25), &games).unwrap_err();
        assert!(matches!(err, ProjectionError::UnsupportedSchedule { week: 2, .. }));
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = ProjectionConfig::default();
        config.simulation.n_sims = 0;
        let result = SeasonSimulator::new(config, ScoringSystem::from_preset("standard").unwrap());
        assert!(matches!(result, Err(ProjectionError::InvalidConfiguration { .. })));
    }
}
