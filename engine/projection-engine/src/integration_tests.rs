//! End-to-end scenarios: roster in, draft board out

use std::collections::{BTreeMap, BTreeSet};

use fantasy_scoring::{ScoringSystem, Stat};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ProjectionConfig;
use crate::draft_board::{by_position, cheat_sheet, DraftBoardExporter};
use crate::models::{
    PlayerInfo, Position, ProjectionInputs, ScheduledGame, TeamContext, UsageHistory, UsagePriors,
};
use crate::player_game::PlayerGameSimulator;
use crate::season::SeasonSimulator;
use crate::shrinkage::RateShrinkage;

const TEAMS: [&str; 4] = ["TEX", "OSU", "UGA", "MICH"];

fn test_config(seed: u64) -> ProjectionConfig {
    let mut config = ProjectionConfig::default();
    config.simulation.seed = Some(seed);
    config.simulation.n_sims = 150;
    config.simulation.worker_threads = Some(3);
    config
}

fn ppr() -> ScoringSystem {
    ScoringSystem::from_preset("ppr").unwrap()
}

fn player(id: &str, position: Position, team: &str, usage: UsagePriors) -> PlayerInfo {
    PlayerInfo {
        player_id: id.to_string(),
        name: format!("{position} {id}"),
        position,
        team: team.to_string(),
        team_context: TeamContext::default(),
        usage: Some(usage),
        history: None,
        depth: None,
    }
}

fn schedule_for(team: &str, weeks: u32) -> Vec<ScheduledGame> {
    (1..=weeks)
        .map(|week| {
            let opponent = TEAMS[(week as usize) % TEAMS.len()];
            ScheduledGame {
                week,
                is_home: week % 2 == 0,
                opponent: if opponent == team { "FCS".to_string() } else { opponent.to_string() },
                vegas_total: 48.0 + (week % 5) as f64 * 2.0,
                spread: Some(if week % 3 == 0 { 3.5 } else { -6.5 }),
                implied_team_total: None,
                opp_pace: 66.0 + (week % 4) as f64 * 2.0,
                opp_pass_defense: Some(0.9 + (week % 3) as f64 * 0.1),
                opp_rush_defense: Some(1.1 - (week % 3) as f64 * 0.1),
                game_script: None,
                inactive: BTreeSet::new(),
            }
        })
        .collect()
}

/// Four teams, each with a QB, two backs, three receivers and a tight end
fn league() -> ProjectionInputs {
    let mut players = Vec::new();
    let mut schedules = BTreeMap::new();

    for (t, team) in TEAMS.iter().enumerate() {
        let bump = t as f64 * 0.01;
        players.push(player(
            &format!("{team}-QB"),
            Position::QB,
            team,
            UsagePriors { completion_rate: Some(0.60 + bump), ..Default::default() },
        ));
        for (slot, share) in [(1, 0.45), (2, 0.25)] {
            players.push(player(
                &format!("{team}-RB{slot}"),
                Position::RB,
                team,
                UsagePriors { rush_share: Some(share + bump), ..Default::default() },
            ));
        }
        for (slot, share) in [(1, 0.26), (2, 0.18), (3, 0.10)] {
            players.push(player(
                &format!("{team}-WR{slot}"),
                Position::WR,
                team,
                UsagePriors { target_share: Some(share + bump), ..Default::default() },
            ));
        }
        players.push(player(
            &format!("{team}-TE1"),
            Position::TE,
            team,
            UsagePriors { target_share: Some(0.14 + bump), ..Default::default() },
        ));
        schedules.insert(team.to_string(), schedule_for(team, 12));
    }

    ProjectionInputs { players, schedules }
}

#[test]
fn test_qb_completions_track_shrunk_prior() {
    let config = ProjectionConfig::default();
    let shrinkage = RateShrinkage::new(config.shrinkage.clone(), config.priors.clone());

    let mut qb = player("QB1", Position::QB, "TEX", UsagePriors::default());
    qb.usage = None;
    qb.history = Some(UsageHistory::default());
    let usage = shrinkage.resolve_usage(&qb);
    assert!((usage.completion_rate.unwrap() - 0.62).abs() < 1e-12);

    let simulator = PlayerGameSimulator::new(config.priors.clone());
    let per_game_attempts = 500.0 / 17.0;
    let mut rng = StdRng::seed_from_u64(17);

    let seasons = 300;
    let mut completions = 0.0;
    for _ in 0..seasons * 17 {
        let line = simulator.simulate_qb_game(per_game_attempts, &usage, 1.0, &mut rng).unwrap();
        completions += line.get(Stat::Completions);
    }

    let per_game = completions / (seasons * 17) as f64;
    let expected = 0.62 * per_game_attempts;
    assert!(
        (per_game - expected).abs() <= expected * 0.05,
        "{per_game:.2} completions per game, expected about {expected:.2}"
    );
}

#[test]
fn test_target_share_drives_receiver_value() {
    let simulator = SeasonSimulator::new(test_config(3), ppr()).unwrap();
    let alpha = player(
        "WR-A",
        Position::WR,
        "TEX",
        UsagePriors { target_share: Some(0.25), ..Default::default() },
    );
    let depth = player(
        "WR-B",
        Position::WR,
        "TEX",
        UsagePriors { target_share: Some(0.05), ..Default::default() },
    );

    let mut schedules = BTreeMap::new();
    schedules.insert("TEX".to_string(), schedule_for("TEX", 12));

    let batch = simulator.simulate_players(&[alpha, depth], &schedules).unwrap();
    assert!(batch.failures.is_empty());
    assert!(batch.distributions[0].mean > batch.distributions[1].mean);
}

#[test]
fn test_bigger_league_loosens_replacement() {
    let inputs = league();
    let exporter = DraftBoardExporter::new(test_config(5), ppr()).unwrap();
    let simulator = SeasonSimulator::new(test_config(5), ppr()).unwrap();
    let batch = simulator.simulate_players(&inputs.players, &inputs.schedules).unwrap();

    let twelve = exporter.build_board(batch.distributions.clone(), Vec::new(), 12, 150).unwrap();
    let fourteen = exporter.build_board(batch.distributions, Vec::new(), 14, 150).unwrap();

    for position in Position::ALL {
        assert!(
            fourteen.replacement_levels[&position] <= twelve.replacement_levels[&position],
            "{position} replacement rose with league size"
        );
    }
}

#[test]
fn test_seeded_boards_are_identical() {
    let inputs = league();
    let exporter = DraftBoardExporter::new(test_config(42), ppr()).unwrap();

    let first = exporter.generate_draft_board(&inputs.players, &inputs.schedules, 12, 150).unwrap();
    let second = exporter.generate_draft_board(&inputs.players, &inputs.schedules, 12, 150).unwrap();

    assert_eq!(first.rows, second.rows);
    assert_eq!(first.replacement_levels, second.replacement_levels);
}

#[test]
fn test_board_covers_league() {
    let inputs = league();
    let exporter = DraftBoardExporter::new(test_config(7), ppr()).unwrap();
    let board = exporter.generate_draft_board(&inputs.players, &inputs.schedules, 10, 150).unwrap();

    assert_eq!(board.rows.len(), inputs.players.len());
    assert!(board.failures.is_empty());
    assert_eq!(board.league_size, 10);
    assert_eq!(board.n_sims, 150);

    for row in &board.rows {
        let d = &row.distribution;
        assert!(row.vorp >= 0.0);
        assert_eq!(d.games, 12);
        assert!(d.p10 <= d.p25 && d.p25 <= d.p50 && d.p50 <= d.p75);
        assert!(d.p75 <= d.p90 && d.p90 <= d.p95 && d.p95 <= d.p99);
    }

    let grouped = by_position(&board);
    assert_eq!(grouped[&Position::WR].len(), 12);
    assert_eq!(grouped[&Position::QB].len(), 4);
    for rows in grouped.values() {
        for pair in rows.windows(2) {
            assert!(pair[0].tier <= pair[1].tier);
        }
    }

    let sheet = cheat_sheet(&board);
    assert_eq!(sheet[0].overall_rank, 1);
    assert!(sheet.iter().all(|row| row.tier_label.starts_with(row.position.as_str())));
}

#[test]
fn test_empty_schedule_yields_zero_distribution() {
    let simulator = SeasonSimulator::new(test_config(9), ppr()).unwrap();
    let mut schedules = BTreeMap::new();
    schedules.insert("BYE".to_string(), Vec::new());

    let idle = player("RB-X", Position::RB, "BYE", UsagePriors::default());
    let batch = simulator.simulate_players(&[idle], &schedules).unwrap();
    let d = &batch.distributions[0];

    assert_eq!(d.games, 0);
    assert_eq!((d.mean, d.std, d.min, d.max), (0.0, 0.0, 0.0, 0.0));
    assert!(d.percentiles().iter().all(|p| *p == 0.0));
}

#[test]
fn test_failed_player_does_not_sink_board() {
    let mut inputs = league();
    let mut broken = schedule_for("BAD", 12);
    broken[4].vegas_total = f64::INFINITY;
    inputs.schedules.insert("BAD".to_string(), broken);
    inputs.players.push(player("BAD-WR1", Position::WR, "BAD", UsagePriors::default()));

    let exporter = DraftBoardExporter::new(test_config(13), ppr()).unwrap();
    let board = exporter.generate_draft_board(&inputs.players, &inputs.schedules, 12, 150).unwrap();

    assert_eq!(board.rows.len(), inputs.players.len() - 1);
    assert_eq!(board.failures.len(), 1);
    assert_eq!(board.failures[0].player_id, "BAD-WR1");
    assert!(board.failures[0].reason.contains("week 5"));
}

#[test]
fn test_inputs_document_parses() {
    let json = r#"{
        "players": [
            {"player_id": "QB7", "name": "Test Passer", "position": "QB", "team": "TEX",
             "team_context": {"pace": 72.0, "pass_rate": 0.6,
                              "conference": {"pace": 69.0, "pass_rate": 0.55}},
             "history": {"completions": 210, "pass_attempts": 320},
             "depth": {"role": "starter"}}
        ],
        "schedules": {
            "TEX": [
                {"week": 1, "is_home": true, "opponent": "OSU", "vegas_total": 54.5,
                 "spread": -3.0, "opp_pace": 70.0}
            ]
        }
    }"#;
    let inputs: ProjectionInputs = serde_json::from_str(json).unwrap();
    assert_eq!(inputs.players[0].position, Position::QB);

    let exporter = DraftBoardExporter::new(test_config(21), ppr()).unwrap();
    let board = exporter.generate_draft_board(&inputs.players, &inputs.schedules, 12, 50).unwrap();
    assert_eq!(board.rows.len(), 1);
    assert!(board.rows[0].distribution.mean > 0.0);
}

#[test]
fn test_config_file_drives_board() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projection.toml");
    std::fs::write(
        &path,
        r#"
        [simulation]
        n_sims = 80
        seed = 11
        worker_threads = 2

        [draft]
        league_size = 10
        tier_overlap_threshold = 0.9
        "#,
    )
    .unwrap();

    let config = ProjectionConfig::from_file(&path).unwrap();
    let inputs = league();
    let exporter = DraftBoardExporter::new(config.clone(), ppr()).unwrap();
    let board = exporter
        .generate_draft_board(
            &inputs.players,
            &inputs.schedules,
            config.draft.league_size,
            config.simulation.n_sims,
        )
        .unwrap();

    assert_eq!(board.n_sims, 80);
    assert_eq!(board.league_size, 10);
}
