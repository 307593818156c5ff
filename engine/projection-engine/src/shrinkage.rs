//! Rate stabilization for sparse usage data
//!
//! Beta-Binomial posterior means for per-player rates, conference-level
//! shrinkage for team tendencies, and the roster adjustments (returning
//! production, depth chart) applied to usage shares. Everything here is pure.

use crate::config::{BetaPrior, PositionPriors, ShrinkageParameters};
use crate::models::{DepthRole, PlayerInfo, Position, TeamContext, UsageHistory, UsagePriors};

/// Posterior mean of a Beta-Binomial rate
///
/// With no attempts this is exactly the prior mean `alpha / (alpha + beta)`.
pub fn shrink_rate(successes: u64, attempts: u64, alpha: f64, beta: f64) -> f64 {
    if attempts == 0 {
        return alpha / (alpha + beta);
    }
    (successes as f64 + alpha) / (attempts as f64 + alpha + beta)
}

/// Blend a team value toward its conference mean
pub fn shrink_to_conference(team_value: f64, conference_mean: f64, weight: f64) -> f64 {
    team_value * (1.0 - weight) + conference_mean * weight
}

/// Scale a share up with the team's returning production, never past 1.0
pub fn adjust_for_returning_production(share: f64, returning_pct: f64, boost: f64) -> f64 {
    (share * (1.0 + returning_pct.clamp(0.0, 1.0) * boost)).min(1.0)
}

/// Scale a projection by depth chart role
///
/// First-year starters at WR take an additional discount.
pub fn apply_depth_chart_modifier(
    projection: f64,
    role: DepthRole,
    position: Position,
    first_year_starter: bool,
    params: &ShrinkageParameters,
) -> f64 {
    let role_multiplier = match role {
        DepthRole::Starter => params.starter_multiplier,
        DepthRole::Backup => params.backup_multiplier,
        DepthRole::ThirdString => params.third_string_multiplier,
    };

    let mut adjusted = projection * role_multiplier;
    if first_year_starter && role == DepthRole::Starter && position == Position::WR {
        adjusted *= params.first_year_wr_discount;
    }
    adjusted
}

fn shrink_with(successes: u64, attempts: u64, prior: BetaPrior) -> f64 {
    shrink_rate(successes, attempts, prior.alpha, prior.beta)
}

/// Turns roster records into the usage and team inputs the simulator reads
#[derive(Debug, Clone)]
pub struct RateShrinkage {
    params: ShrinkageParameters,
    priors: PositionPriors,
}

impl RateShrinkage {
    pub fn new(params: ShrinkageParameters, priors: PositionPriors) -> Self {
        Self { params, priors }
    }

    pub fn params(&self) -> &ShrinkageParameters {
        &self.params
    }

    /// Conference blend at the configured weight
    pub fn toward_conference(&self, team_value: f64, conference_mean: f64) -> f64 {
        shrink_to_conference(team_value, conference_mean, self.params.conference_weight)
    }

    /// Shrink each observed rate toward its position prior
    pub fn usage_from_history(&self, position: Position, history: &UsageHistory) -> UsagePriors {
        match position {
            Position::QB => UsagePriors {
                completion_rate: Some(shrink_with(
                    history.completions,
                    history.pass_attempts,
                    self.priors.qb.completion_rate,
                )),
                ..Default::default()
            },
            Position::RB => {
                let rb = &self.priors.rb;
                UsagePriors {
                    rush_share: Some(shrink_with(history.carries, history.team_carries, rb.rush_share)),
                    target_share: Some(shrink_with(
                        history.targets,
                        history.team_targets,
                        rb.target_share,
                    )),
                    catch_rate: Some(shrink_with(history.receptions, history.targets, rb.catch_rate)),
                    rz_share: Some(shrink_with(
                        history.red_zone_touches,
                        history.team_red_zone_plays,
                        rb.red_zone_share,
                    )),
                    ..Default::default()
                }
            }
            Position::WR | Position::TE => {
                let receiver =
                    if position == Position::WR { &self.priors.wr } else { &self.priors.te };
                UsagePriors {
                    target_share: Some(shrink_with(
                        history.targets,
                        history.team_targets,
                        receiver.target_share,
                    )),
                    catch_rate: Some(shrink_with(
                        history.receptions,
                        history.targets,
                        receiver.catch_rate,
                    )),
                    rz_target_share: Some(shrink_with(
                        history.red_zone_touches,
                        history.team_red_zone_plays,
                        receiver.red_zone_share,
                    )),
                    ..Default::default()
                }
            }
        }
    }

    /// Usage the simulator should run with for this player
    ///
    /// Explicit usage wins over history; unset fields take position defaults,
    /// except that a red-zone share is left unset when the player's own rush or
    /// target share is known. Shares are then adjusted for returning
    /// production and depth chart role.
    pub fn resolve_usage(&self, player: &PlayerInfo) -> UsagePriors {
        let observed = match (&player.usage, &player.history) {
            (Some(usage), _) => usage.clone(),
            (None, Some(history)) => self.usage_from_history(player.position, history),
            (None, None) => UsagePriors::default(),
        };
        let mut usage =
            observed.or(self.priors.usage_defaults.for_position(player.position));

        // A player's own share implies their red-zone share; the samplers derive it
        if observed.rush_share.is_some() && observed.rz_share.is_none() {
            usage.rz_share = None;
        }
        if observed.target_share.is_some() && observed.rz_target_share.is_none() {
            usage.rz_target_share = None;
        }

        if let Some(returning) = player.team_context.returning_production {
            let boost = self.params.returning_production_boost;
            usage.target_share =
                usage.target_share.map(|s| adjust_for_returning_production(s, returning, boost));
            usage.rush_share =
                usage.rush_share.map(|s| adjust_for_returning_production(s, returning, boost));
        }

        if let Some(depth) = &player.depth {
            let modify = |share: f64| {
                apply_depth_chart_modifier(
                    share,
                    depth.role,
                    player.position,
                    depth.first_year_starter,
                    &self.params,
                )
            };
            usage.target_share = usage.target_share.map(modify);
            usage.rush_share = usage.rush_share.map(modify);
            usage.rz_share = usage.rz_share.map(modify);
            usage.rz_target_share = usage.rz_target_share.map(modify);
        }

        usage
    }

    /// Team tendencies with pace and pass rate pulled toward the conference
    pub fn resolve_team(&self, team: &TeamContext) -> TeamContext {
        let mut resolved = team.clone();
        if let Some(conference) = &team.conference {
            resolved.pace = self.toward_conference(team.pace, conference.pace);
            resolved.pass_rate = self.toward_conference(team.pass_rate, conference.pass_rate);
        }
        resolved
    }
}

impl Default for RateShrinkage {
    fn default() -> Self {
        Self::new(ShrinkageParameters::default(), PositionPriors::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConferenceBaseline, DepthChart};
    use crate::player_game::PlayerGameSimulator;

    fn player(position: Position) -> PlayerInfo {
        PlayerInfo {
            player_id: format!("{position}1"),
            name: String::new(),
            position,
            team: "TEX".to_string(),
            team_context: TeamContext::default(),
            usage: None,
            history: None,
            depth: None,
        }
    }

    #[test]
    fn test_shrink_rate_without_attempts_is_prior_mean() {
        assert_eq!(shrink_rate(0, 0, 62.0, 38.0), 62.0 / 100.0);
        assert_eq!(shrink_rate(5, 0, 1.0, 3.0), 0.25);
    }

    #[test]
    fn test_shrink_rate_posterior_mean() {
        // 7 of 10 with a Beta(3, 7) prior
        assert!((shrink_rate(7, 10, 3.0, 7.0) - 0.5).abs() < 1e-12);

        // Large samples dominate the prior
        let rate = shrink_rate(6_500, 10_000, 62.0, 38.0);
        assert!((rate - 0.65).abs() < 0.001);
    }

    #[test]
    fn test_shrink_to_conference() {
        assert_eq!(shrink_to_conference(80.0, 70.0, 0.0), 80.0);
        assert_eq!(shrink_to_conference(80.0, 70.0, 1.0), 70.0);
        assert!((shrink_to_conference(80.0, 70.0, 0.3) - 77.0).abs() < 1e-12);
    }

    #[test]
    fn test_returning_production_is_capped() {
        assert!((adjust_for_returning_production(0.20, 1.0, 0.15) - 0.23).abs() < 1e-12);
        assert_eq!(adjust_for_returning_production(0.20, 0.0, 0.15), 0.20);
        assert_eq!(adjust_for_returning_production(0.95, 1.0, 0.15), 1.0);
        // Out-of-range percentages are clamped
        assert!((adjust_for_returning_production(0.20, 3.0, 0.15) - 0.23).abs() < 1e-12);
    }

    #[test]
    fn test_depth_chart_modifier() {
        let params = ShrinkageParameters::default();

        assert_eq!(
            apply_depth_chart_modifier(100.0, DepthRole::Starter, Position::RB, false, &params),
            100.0
        );
        assert!(
            (apply_depth_chart_modifier(100.0, DepthRole::Backup, Position::RB, false, &params)
                - 35.0)
                .abs()
                < 1e-9
        );
        assert!(
            (apply_depth_chart_modifier(100.0, DepthRole::Starter, Position::WR, true, &params)
                - 90.0)
                .abs()
                < 1e-9
        );
        // First-year discount is WR only
        assert_eq!(
            apply_depth_chart_modifier(100.0, DepthRole::Starter, Position::TE, true, &params),
            100.0
        );
    }

    #[test]
    fn test_usage_from_empty_history_is_prior_means() {
        let shrinkage = RateShrinkage::default();
        let usage = shrinkage.usage_from_history(Position::QB, &UsageHistory::default());
        assert!((usage.completion_rate.unwrap() - 0.62).abs() < 1e-12);

        let wr = shrinkage.usage_from_history(Position::WR, &UsageHistory::default());
        assert!((wr.target_share.unwrap() - 0.20).abs() < 1e-12);
        assert!((wr.catch_rate.unwrap() - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_usage_precedence() {
        let shrinkage = RateShrinkage::default();

        let mut explicit = player(Position::WR);
        explicit.usage = Some(UsagePriors { target_share: Some(0.27), ..Default::default() });
        explicit.history = Some(UsageHistory { targets: 10, team_targets: 100, ..Default::default() });
        let usage = shrinkage.resolve_usage(&explicit);
        assert_eq!(usage.target_share, Some(0.27));
        assert_eq!(usage.adot, Some(10.5));

        let mut from_history = player(Position::WR);
        from_history.history =
            Some(UsageHistory { targets: 120, team_targets: 400, ..Default::default() });
        let usage = shrinkage.resolve_usage(&from_history);
        // (120 + 4) / (400 + 20)
        assert!((usage.target_share.unwrap() - 124.0 / 420.0).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_usage_applies_depth_and_returning_production() {
        let shrinkage = RateShrinkage::default();
        let mut backup = player(Position::RB);
        backup.depth = Some(DepthChart { role: DepthRole::Backup, first_year_starter: false });
        backup.team_context.returning_production = Some(1.0);

        let usage = shrinkage.resolve_usage(&backup);
        // 0.25 × 1.15 × 0.35
        assert!((usage.rush_share.unwrap() - 0.25 * 1.15 * 0.35).abs() < 1e-12);
        assert!((usage.rz_share.unwrap() - 0.30 * 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_red_zone_share_follows_own_share() {
        let shrinkage = RateShrinkage::default();
        let simulator = PlayerGameSimulator::default();

        let mut depth_wr = player(Position::WR);
        depth_wr.usage = Some(UsagePriors { target_share: Some(0.05), ..Default::default() });
        let usage = shrinkage.resolve_usage(&depth_wr);
        assert_eq!(usage.rz_target_share, None);
        // 0.05 × 0.8
        assert!((simulator.red_zone_share(Position::WR, &usage) - 0.04).abs() < 1e-12);

        let mut bellcow = player(Position::RB);
        bellcow.usage = Some(UsagePriors { rush_share: Some(0.60), ..Default::default() });
        let usage = shrinkage.resolve_usage(&bellcow);
        assert_eq!(usage.rz_share, None);
        // 0.60 × 1.2
        assert!((simulator.red_zone_share(Position::RB, &usage) - 0.72).abs() < 1e-12);

        // An explicit red-zone share is kept
        let mut goal_line = player(Position::RB);
        goal_line.usage =
            Some(UsagePriors { rush_share: Some(0.2), rz_share: Some(0.5), ..Default::default() });
        let usage = shrinkage.resolve_usage(&goal_line);
        assert_eq!(simulator.red_zone_share(Position::RB, &usage), 0.5);

        // Without any usage the position default applies
        let usage = shrinkage.resolve_usage(&player(Position::WR));
        assert_eq!(usage.rz_target_share, Some(0.15));
    }

    #[test]
    fn test_resolve_team_blends_toward_conference() {
        let shrinkage = RateShrinkage::default();
        let mut team = TeamContext { pace: 80.0, pass_rate: 0.70, ..Default::default() };
        assert_eq!(shrinkage.resolve_team(&team), team);

        team.conference = Some(ConferenceBaseline { pace: 70.0, pass_rate: 0.50 });
        let resolved = shrinkage.resolve_team(&team);
        assert!((resolved.pace - 77.0).abs() < 1e-12);
        assert!((resolved.pass_rate - 0.64).abs() < 1e-12);
    }
}
