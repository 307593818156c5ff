use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fantasy_scoring::{ScoringConfig, ScoringSystem};
use projection_engine::draft_board::{by_position, cheat_sheet};
use projection_engine::logging::initialize_logging_with_config;
use projection_engine::{DraftBoardExporter, ProjectionConfig, ProjectionInputs};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Monte Carlo season projections and draft boards
#[derive(Parser)]
#[command(name = "projection-engine")]
#[command(version, about = "Season projections, VORP and tiered draft boards")]
struct Cli {
    /// Projection config (TOML); defaults plus PROJ_* overrides when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: compact, pretty or json
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate all players and write the draft board
    Board {
        /// Players and schedules (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./projections")]
        output: PathBuf,

        /// Scoring preset: standard, ppr, half_ppr, 6pt_passing_td
        #[arg(long, default_value = "ppr", conflicts_with = "scoring_file")]
        scoring_preset: String,

        /// Custom scoring document (JSON or TOML)
        #[arg(long)]
        scoring_file: Option<PathBuf>,

        #[arg(long)]
        league_size: Option<usize>,

        #[arg(long)]
        n_sims: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        workers: Option<usize>,
    },
    /// Write the default configuration to a TOML file
    InitConfig {
        #[arg(default_value = "projection.toml")]
        path: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<ProjectionConfig> {
    match path {
        Some(path) => {
            let mut config = ProjectionConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_env().context("Invalid PROJ_* environment override")?;
            Ok(config)
        }
        None => ProjectionConfig::from_env().context("Invalid PROJ_* environment override"),
    }
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    initialize_logging_with_config(&config.logging)?;

    match cli.command {
        Commands::InitConfig { path } => {
            config.to_file(&path)?;
            println!("✅ Default configuration written to {}", path.display());
        }
        Commands::Board {
            input,
            output,
            scoring_preset,
            scoring_file,
            league_size,
            n_sims,
            seed,
            workers,
        } => {
            if let Some(league_size) = league_size {
                config.draft.league_size = league_size;
            }
            if let Some(n_sims) = n_sims {
                config.simulation.n_sims = n_sims;
            }
            if seed.is_some() {
                config.simulation.seed = seed;
            }
            if workers.is_some() {
                config.simulation.worker_threads = workers;
            }
            config.validate().context("Invalid projection configuration")?;

            let scoring_config = match &scoring_file {
                Some(path) => ScoringConfig::from_file(path)
                    .with_context(|| format!("Failed to load scoring from {}", path.display()))?,
                None => ScoringConfig::preset(&scoring_preset)?,
            };
            let scoring = ScoringSystem::new(scoring_config).context("Invalid scoring rules")?;

            let raw = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let inputs: ProjectionInputs = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", input.display()))?;

            println!(
                "🏈 Projecting {} players over {} seasons each...",
                inputs.players.len(),
                config.simulation.n_sims
            );

            let league_size = config.draft.league_size;
            let n_sims = config.simulation.n_sims;
            let exporter = DraftBoardExporter::new(config, scoring)?;
            let board =
                exporter.generate_draft_board(&inputs.players, &inputs.schedules, league_size, n_sims)?;

            fs::create_dir_all(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            write_json(&output, "draft_board.json", &board)?;
            write_json(&output, "cheat_sheet.json", &cheat_sheet(&board))?;
            for (position, rows) in by_position(&board) {
                write_json(&output, &format!("{position}_projections.json"), &rows)?;
            }

            for failure in &board.failures {
                warn!("{}", failure);
            }

            println!("✅ Draft board: {} players ranked", board.rows.len());
            for row in board.rows.iter().take(10) {
                let d = &row.distribution;
                println!(
                    "  {:>3}. {:<24} {}{:<3} tier {:<2} mean {:>6.1}  VORP {:>6.1}",
                    row.overall_rank, d.name, d.position, row.position_rank, row.tier, d.mean, row.vorp
                );
            }
            if !board.failures.is_empty() {
                println!("⚠️  {} players failed to simulate", board.failures.len());
            }
        }
    }

    Ok(())
}
