use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use jlwe_scoring::config::{self, Config};
use jlwe_scoring::fetch::{MutationOutcome, ScoreSource};
use jlwe_scoring::output;
use jlwe_scoring::scoring::{parse_range, RankingStyle, ScoringConfig, ScoringSession};
use jlwe_scoring::snapshot::{
    parse_late_minutes, storage, BackendClient, BackendError, BatchOp, CacheNumber, ExtrasItemId,
    FinalScore, Mutation, MutationError, SnapshotError, TeamId,
};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_DATA: i32 = 3;
const EXIT_CONFIG: i32 = 4;
const EXIT_MISMATCH: i32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Per-team score breakdown with reconciliation flags (default)
    Scores {
        /// Show the full breakdown for one team
        #[arg(long)]
        team: Option<i64>,
    },
    /// Teams ranked by final score
    Leaderboard {
        /// Ranking style for tied scores (overrides config)
        #[arg(long, value_enum)]
        ranking: Option<RankingStyle>,
        /// Include non-competing teams
        #[arg(long)]
        all: bool,
    },
    /// Best cache award for each hide point category
    BestCaches,
    /// Data inconsistencies found in the snapshot
    Warnings,
    /// Winner, runner-up, NAGA and place ranges for the award ceremony
    Awards {
        /// Place range to list, e.g. "4-10" (repeatable)
        #[arg(long = "range")]
        ranges: Vec<String>,
    },
    /// Write the full scoring report as JSON
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Set or clear a team's final score ("37.5", "dsq", or "" to clear)
    ///
    /// An empty score leaves the team unset; it is not stored as 0.
    SetFinalScore {
        team: i64,
        #[arg(allow_hyphen_values = true)]
        score: String,
    },
    /// Set a team's count for an extras item
    SetExtra { team: i64, item: i64, count: i64 },
    /// Set minutes late ("15" or a duration such as "1h15m")
    SetLate { team: i64, minutes: String },
    /// Mark a cache as found (or not found with --not-found) by a team
    SetFind {
        team: i64,
        cache: u32,
        #[arg(long)]
        not_found: bool,
    },
    /// Apply a YAML batch of updates
    Apply { file: PathBuf },
    /// Create a config file interactively
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "jlwe-scoring")]
#[command(about = "Score aggregation and reconciliation for the JLWE geocaching game", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/jlwe-scoring/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Read scores from a saved get_scores.cgi response instead of the backend
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Exit with status 5 when any final score disagrees with its computed total
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Initialize logging. RUST_LOG takes precedence over --verbose.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set up logging: {}", e);
    }
}

/// Map an error chain to the documented exit status.
fn exit_code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<BackendError>() {
            return match e {
                BackendError::InvalidUrl(_) | BackendError::InvalidCookie => EXIT_CONFIG,
                BackendError::Snapshot(_) => EXIT_DATA,
                BackendError::Mutation(_) => EXIT_FAILURE,
                BackendError::Http(_) | BackendError::Api(_) => EXIT_NETWORK,
            };
        }
        if cause.downcast_ref::<SnapshotError>().is_some() {
            return EXIT_DATA;
        }
        if cause.downcast_ref::<MutationError>().is_some() {
            return EXIT_FAILURE;
        }
    }
    EXIT_FAILURE
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(Commands::Init) = cli.command {
        match config::run_init_wizard(cli.config) {
            Ok(()) => std::process::exit(EXIT_SUCCESS),
            Err(e) => {
                eprintln!("Init failed: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
    }

    // Load config
    let config = match config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let source = match build_source(&cli, &config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let code = match run(cli, &config, &source).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

fn build_source(cli: &Cli, config: &Config) -> Result<ScoreSource> {
    if let Some(ref path) = cli.snapshot {
        debug!("Using snapshot file {}", path.display());
        return Ok(ScoreSource::File(path.clone()));
    }

    let backend = config.backend.as_ref().with_context(|| {
        "No data source: pass --snapshot FILE or add a backend section with base_url to the config \
         (run `jlwe-scoring init`)"
            .to_string()
    })?;
    let client = BackendClient::new(
        &backend.base_url,
        backend.session_cookie.as_deref(),
        backend.timeout(),
    )
    .context("Failed to create backend client")?;
    info!("Using backend at {}", backend.base_url);
    Ok(ScoreSource::Remote(client))
}

async fn run(cli: Cli, config: &Config, source: &ScoreSource) -> Result<i32> {
    let mut scoring = config.scoring_or_default();
    let command = cli.command.unwrap_or(Commands::Scores { team: None });
    let use_colors = output::should_use_colors();

    if let Commands::Leaderboard { ranking, all } = &command {
        if ranking.is_some() {
            scoring.ranking = *ranking;
        }
        if *all {
            scoring.include_non_competing = Some(true);
        }
    }

    let mutations = match &command {
        Commands::SetFinalScore { team, score } => {
            let final_score = FinalScore::parse_points(score)
                .ok_or_else(|| MutationError::InvalidScore(score.clone()))?;
            vec![Mutation::SetFinalScore {
                team_id: TeamId(*team),
                final_score,
            }]
        }
        Commands::SetExtra { team, item, count } => vec![Mutation::SetExtraFindCount {
            team_id: TeamId(*team),
            item_id: ExtrasItemId(*item),
            count: *count,
        }],
        Commands::SetLate { team, minutes } => vec![Mutation::SetLateMinutes {
            team_id: TeamId(*team),
            minutes: parse_late_minutes(minutes)?,
        }],
        Commands::SetFind {
            team,
            cache,
            not_found,
        } => vec![Mutation::SetTradFind {
            team_id: TeamId(*team),
            cache: CacheNumber(*cache),
            found: !not_found,
        }],
        Commands::Apply { file } => load_batch(file)?,
        _ => Vec::new(),
    };

    if !mutations.is_empty() {
        return apply_and_report(source, mutations, &scoring, cli.format, use_colors).await;
    }

    let session = source.load_session(&scoring).await?;
    let mismatches = session
        .team_scores()
        .iter()
        .filter(|s| s.reconciliation_status.is_mismatch())
        .count();

    match command {
        Commands::Scores { team } => print_scores(&session, team, cli.format, cli.verbose, use_colors)?,
        Commands::Leaderboard { .. } => {
            let entries = session.leaderboard();
            match cli.format {
                OutputFormat::Table => println!("{}", output::format_leaderboard(&entries, use_colors)),
                OutputFormat::Tsv => println!("{}", output::format_tsv_leaderboard(&entries)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            }
        }
        Commands::BestCaches => {
            let awards = session.best_cache_awards();
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&awards)?),
                _ => println!("{}", output::format_best_caches(&awards, use_colors)),
            }
        }
        Commands::Warnings => {
            let warnings = session.warnings();
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&warnings)?),
                _ => println!("{}", output::format_warnings(&warnings, use_colors)),
            }
        }
        Commands::Awards { ranges } => {
            let ranges = ranges
                .iter()
                .map(|r| parse_range(r).with_context(|| format!("Invalid place range '{}', expected e.g. 4-10", r)))
                .collect::<Result<Vec<_>>>()?;
            let podium = session.podium();
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&podium)?),
                _ => println!("{}", output::format_podium(&podium, &ranges, use_colors)),
            }
        }
        Commands::Export { out } => {
            let report = session.report(Utc::now());
            storage::write_json(&out, &report)?;
            println!(
                "Wrote report for {} teams to {}",
                report.teams.len(),
                out.display()
            );
        }
        _ => {}
    }

    if cli.strict && mismatches > 0 {
        eprintln!("{} team(s) have a final score that does not match the computed total", mismatches);
        return Ok(EXIT_MISMATCH);
    }
    Ok(EXIT_SUCCESS)
}

fn print_scores(
    session: &ScoringSession,
    team: Option<i64>,
    format: OutputFormat,
    verbose: bool,
    use_colors: bool,
) -> Result<()> {
    let scores = match team {
        Some(id) => vec![session
            .team_score(TeamId(id))
            .with_context(|| format!("Team {} not found", id))?],
        None => session.team_scores(),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scores)?),
        OutputFormat::Tsv => println!("{}", output::format_tsv_scores(&scores)),
        OutputFormat::Table if team.is_some() || verbose => {
            let details: Vec<String> = scores
                .iter()
                .map(|s| output::format_team_detail(s, use_colors))
                .collect();
            println!("{}", details.join("\n\n"));
        }
        OutputFormat::Table => println!("{}", output::format_team_scores(&scores, use_colors)),
    }
    Ok(())
}

fn load_batch(path: &Path) -> Result<Vec<Mutation>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file at {}", path.display()))?;
    let ops: Vec<BatchOp> = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse batch file: invalid YAML in {}", path.display()))?;

    ops.into_iter()
        .enumerate()
        .map(|(i, op)| {
            op.into_mutation()
                .with_context(|| format!("Invalid entry #{} in {}", i + 1, path.display()))
        })
        .collect()
}

/// Send updates, then re-load the full snapshot and show the affected teams.
async fn apply_and_report(
    source: &ScoreSource,
    mutations: Vec<Mutation>,
    scoring: &ScoringConfig,
    format: OutputFormat,
    use_colors: bool,
) -> Result<i32> {
    let outcomes: Vec<MutationOutcome> = source.apply_all(mutations).await;

    let mut failed = 0;
    let mut team_ids = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(message) => {
                println!("{}: {}", outcome.mutation, message);
                if !team_ids.contains(&outcome.mutation.team_id()) {
                    team_ids.push(outcome.mutation.team_id());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{:#}", e);
            }
        }
    }

    if !team_ids.is_empty() {
        let session = source.load_session(scoring).await?;
        let scores: Vec<_> = team_ids
            .iter()
            .filter_map(|id| session.team_score(*id))
            .collect();
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scores)?),
            OutputFormat::Tsv => println!("{}", output::format_tsv_scores(&scores)),
            OutputFormat::Table => println!("{}", output::format_team_scores(&scores, use_colors)),
        }
    }

    if failed == 0 {
        Ok(EXIT_SUCCESS)
    } else {
        let first_error = outcomes.iter().find_map(|o| o.result.as_ref().err());
        Ok(first_error.map(exit_code_for).unwrap_or(EXIT_FAILURE))
    }
}
