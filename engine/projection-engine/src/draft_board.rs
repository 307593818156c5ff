//! Draft board construction: replacement levels, VORP, tiers and risk metrics

use chrono::Utc;
use fantasy_scoring::ScoringSystem;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

use crate::config::{DraftParameters, ProjectionConfig};
use crate::error::{ProjectionError, Result, SimulationFailure};
use crate::models::{
    CheatSheetRow, DraftBoard, DraftBoardRow, PlayerInfo, Position, ScheduledGame,
    SeasonDistribution,
};
use crate::season::SeasonSimulator;
use crate::BASELINE_LEAGUE_SIZE;

/// Mean descending, then player id ascending
fn by_mean_desc(a: &SeasonDistribution, b: &SeasonDistribution) -> Ordering {
    b.mean.total_cmp(&a.mean).then_with(|| a.player_id.cmp(&b.player_id))
}

/// Ratio against the mean, zero when the mean is zero
fn relative(value: f64, mean: f64) -> f64 {
    if mean == 0.0 {
        0.0
    } else {
        value / mean
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Ranks simulated players into a tiered draft board
#[derive(Debug, Clone)]
pub struct DraftBoardExporter {
    config: ProjectionConfig,
    scoring: ScoringSystem,
}

impl DraftBoardExporter {
    pub fn new(config: ProjectionConfig, scoring: ScoringSystem) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, scoring })
    }

    pub fn params(&self) -> &DraftParameters {
        &self.config.draft
    }

    /// Simulate every player and build the board
    pub fn generate_draft_board(
        &self,
        players: &[PlayerInfo],
        schedules: &BTreeMap<String, Vec<ScheduledGame>>,
        league_size: usize,
        n_sims: usize,
    ) -> Result<DraftBoard> {
        let mut config = self.config.clone();
        config.simulation.n_sims = n_sims;
        config.draft.league_size = league_size;

        let simulator = SeasonSimulator::new(config, self.scoring.clone())?;
        let batch = simulator.simulate_players(players, schedules)?;

        self.build_board(batch.distributions, batch.failures, league_size, n_sims)
    }

    /// Replacement rank for a position, scaled from the 12-team baseline
    pub fn replacement_rank(&self, position: Position, league_size: usize) -> usize {
        let baseline = self.config.draft.replacement_ranks.for_position(position);
        (baseline * league_size / BASELINE_LEAGUE_SIZE).max(1)
    }

    /// Mean points of the freely available player at each position
    pub fn replacement_levels(
        &self,
        distributions: &[SeasonDistribution],
        league_size: usize,
    ) -> BTreeMap<Position, f64> {
        let mut levels = BTreeMap::new();

        for position in Position::ALL {
            let mut pool: Vec<&SeasonDistribution> =
                distributions.iter().filter(|d| d.position == position).collect();
            pool.sort_by(|a, b| by_mean_desc(a, b));

            let rank = self.replacement_rank(position, league_size);
            let level = match pool.last() {
                None => {
                    warn!("No {} players in the pool, replacement level set to 0", position);
                    0.0
                }
                Some(_) if pool.len() > rank => pool[rank - 1].mean,
                Some(last) => last.mean * self.config.draft.thin_pool_factor,
            };

            levels.insert(position, level);
        }

        levels
    }

    /// Rank, tier and annotate distributions
    pub fn build_board(
        &self,
        distributions: Vec<SeasonDistribution>,
        failures: Vec<SimulationFailure>,
        league_size: usize,
        n_sims: usize,
    ) -> Result<DraftBoard> {
        if league_size == 0 {
            return Err(ProjectionError::invalid_config("league_size must be at least 1"));
        }

        let replacement_levels = self.replacement_levels(&distributions, league_size);
        let tiers = self.assign_tiers(&distributions);

        let mut rows: Vec<DraftBoardRow> = distributions
            .iter()
            .map(|d| {
                let replacement_level = replacement_levels.get(&d.position).copied().unwrap_or(0.0);
                let vorp = (d.mean - replacement_level).max(0.0);
                let position_rank = 1 + distributions
                    .iter()
                    .filter(|other| other.position == d.position && other.mean > d.mean)
                    .count();

                let (cv, upside, floor, consistency) = if d.mean == 0.0 {
                    (0.0, 0.0, 0.0, 0.0)
                } else {
                    let cv = relative(d.std, d.mean);
                    (
                        cv,
                        relative(d.p90 - d.mean, d.mean),
                        relative(d.mean - d.p10, d.mean),
                        1.0 / (1.0 + cv),
                    )
                };

                DraftBoardRow {
                    distribution: d.clone(),
                    replacement_level,
                    vorp,
                    position_rank,
                    tier: tiers.get(d.player_id.as_str()).copied().unwrap_or(1),
                    cv,
                    upside,
                    floor,
                    consistency,
                    value_score: vorp * consistency,
                    adp: 0,
                    adp_diff: 0,
                    overall_rank: 0,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.vorp
                .total_cmp(&a.vorp)
                .then_with(|| by_mean_desc(&a.distribution, &b.distribution))
        });

        let mut seen: HashMap<Position, usize> = HashMap::new();
        for (i, row) in rows.iter_mut().enumerate() {
            row.overall_rank = i + 1;
            let count = seen.entry(row.distribution.position).or_insert(0);
            *count += 1;
            row.adp = *count;
            row.adp_diff = row.position_rank as i64 - row.adp as i64;
        }

        info!(
            "Draft board built: {} players, {} failures, {}-team league",
            rows.len(),
            failures.len(),
            league_size
        );

        Ok(DraftBoard {
            generated_at: Utc::now(),
            league_size,
            n_sims,
            replacement_levels,
            rows,
            failures,
        })
    }

    /// Tier per player id
    ///
    /// Within a position by descending mean, a player stays in the running tier
    /// while their p75 reaches the overlap threshold of the tier floor (the
    /// p25 of the player who opened the tier).
    fn assign_tiers<'a>(&self, distributions: &'a [SeasonDistribution]) -> HashMap<&'a str, usize> {
        let threshold = self.config.draft.tier_overlap_threshold;
        let mut tiers = HashMap::with_capacity(distributions.len());

        for position in Position::ALL {
            let mut pool: Vec<&SeasonDistribution> =
                distributions.iter().filter(|d| d.position == position).collect();
            pool.sort_by(|a, b| by_mean_desc(a, b));

            let mut tier = 1;
            let mut tier_floor = match pool.first() {
                Some(first) => first.p25,
                None => continue,
            };

            for (i, player) in pool.iter().enumerate() {
                if i > 0 && player.p75 < threshold * tier_floor {
                    tier += 1;
                    tier_floor = player.p25;
                }
                tiers.insert(player.player_id.as_str(), tier);
            }
        }

        tiers
    }
}

/// Condensed draft-day view in board order
pub fn cheat_sheet(board: &DraftBoard) -> Vec<CheatSheetRow> {
    board
        .rows
        .iter()
        .map(|row| {
            let d = &row.distribution;
            CheatSheetRow {
                overall_rank: row.overall_rank,
                player_id: d.player_id.clone(),
                name: d.name.clone(),
                position: d.position,
                team: d.team.clone(),
                position_rank: row.position_rank,
                tier: row.tier,
                tier_label: format!("{}{}", d.position, row.tier),
                mean: round1(d.mean),
                vorp: round1(row.vorp),
                consistency: round1(row.consistency),
                upside: round1(row.upside),
                adp_diff: row.adp_diff,
            }
        })
        .collect()
}

/// Board rows grouped by position, board order kept within each group
pub fn by_position(board: &DraftBoard) -> BTreeMap<Position, Vec<DraftBoardRow>> {
    let mut grouped: BTreeMap<Position, Vec<DraftBoardRow>> = BTreeMap::new();
    for row in &board.rows {
        grouped.entry(row.distribution.position).or_default().push(row.clone());
    }
    grouped
}
