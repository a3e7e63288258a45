use anyhow::{bail, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scouting_roles_server::artifacts::{
    FsArtifactStore, PlayerId, PlayerSeasonKey, SeasonId, StoreSettings,
    DEFAULT_POSTERIOR_TOLERANCE,
};
use scouting_roles_server::check::{check_artifacts, CheckReport};
use scouting_roles_server::query::{QuerySettings, RoleQueries};
use scouting_roles_server::roles::HYBRID_THRESHOLD;

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the cohort's clustering artifacts.
    #[clap(value_parser = parse_path)]
    pub artifacts_dir: PathBuf,

    /// Verify every artifact, print the problems found and exit.
    #[clap(long)]
    pub check_only: bool,

    /// Number of neighbor edges whose similarity is recomputed by `check`.
    #[clap(long, default_value_t = 200)]
    pub edge_sample: usize,

    #[clap(long, default_value_t = HYBRID_THRESHOLD)]
    pub hybrid_threshold: f64,

    #[clap(long)]
    pub embedding_dim: Option<usize>,
}

#[derive(Parser)]
#[command(name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Shows the tactical role of a player in a season.
    Role {
        player_id: PlayerId,
        season_id: SeasonId,
    },

    /// Lists the most similar players across all seasons.
    Similar {
        player_id: PlayerId,
        season_id: SeasonId,
        #[clap(short, long)]
        k: Option<usize>,
    },

    /// Shows the seasons found in the artifacts directory.
    Seasons,

    /// Loads every artifact and reports integrity problems.
    Check,

    /// Shows the path of the current artifacts directory.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = ">> ";

fn print_report(report: &CheckReport) {
    for season in report.seasons.iter() {
        println!(
            "Season {}: {} style vectors, {} posteriors",
            season.season_id, season.style_vectors, season.posteriors
        );
    }
    println!(
        "Neighbor table: {} edges, {} recomputed",
        report.neighbor_edges, report.checked_edges
    );
    if !report.problems.is_empty() {
        println!("Found {} problems:", report.problems.len());
        for problem in report.problems.iter() {
            println!("- {}", problem);
        }
        println!();
    }
}

fn execute_command(
    line: String,
    queries: &RoleQueries,
    artifacts_dir: &str,
    edge_sample: usize,
) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => {
            println!("{} {}", PROMPT, &line);
            match cli.command {
                InnerCommand::Role {
                    player_id,
                    season_id,
                } => match queries.get_role(PlayerSeasonKey::new(player_id, season_id)) {
                    Ok(Some(assignment)) => {
                        println!(
                            "{} (confidence {:.3}{})",
                            assignment.role,
                            assignment.confidence,
                            if assignment.is_hybrid { ", hybrid" } else { "" }
                        );
                        for top in assignment.top_roles.iter() {
                            println!("  {:>6.1}%  {}", top.probability * 100.0, top.role);
                        }
                        println!("{}", assignment.tooltip);
                    }
                    Ok(None) => println!("No role data for player {} in season {}", player_id, season_id),
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::Similar {
                    player_id,
                    season_id,
                    k,
                } => match queries.get_similar(PlayerSeasonKey::new(player_id, season_id), k) {
                    Ok(similar) if similar.is_empty() => println!("No similar players found."),
                    Ok(similar) => {
                        for player in similar.iter() {
                            println!(
                                "{:>3}%  {} ({})  {}  {}",
                                player.similarity,
                                player.player_name.as_deref().unwrap_or("?"),
                                player.player_id,
                                player.season_id,
                                player.role.as_deref().unwrap_or("-"),
                            );
                        }
                    }
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::Seasons => match queries.available_seasons() {
                    Ok(seasons) => {
                        println!("{:?}", seasons);
                        println!("{} loaded", queries.loaded_season_count());
                    }
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::Check => {
                    print_report(&check_artifacts(queries.store().as_ref(), edge_sample))
                }
                InnerCommand::Where => {
                    println!("{}", artifacts_dir);
                }
                InnerCommand::Exit => return CommandExecutionResult::Exit,
            }
        }

        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
        }
    }
    CommandExecutionResult::Ok
}

#[derive(rustyline_derive::Hinter)]
struct MyHelper {
    commands_names: Vec<String>,
}

impl MyHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        MyHelper { commands_names }
    }
}

impl Completer for MyHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for MyHelper {}
impl Validator for MyHelper {}
impl Helper for MyHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let store = FsArtifactStore::new(
        &cli_args.artifacts_dir,
        StoreSettings {
            posterior_tolerance: DEFAULT_POSTERIOR_TOLERANCE,
            embedding_dim: cli_args.embedding_dim,
            cluster_count: None,
        },
    );

    if cli_args.check_only {
        let report = check_artifacts(&store, cli_args.edge_sample);
        print_report(&report);
        if !report.is_clean() {
            bail!("Artifacts in {:?} failed the check", cli_args.artifacts_dir);
        }
        println!("Artifacts checked, no issues found.");
        return Ok(());
    }

    let queries = RoleQueries::new(
        "cli",
        Arc::new(store),
        QuerySettings {
            hybrid_threshold: cli_args.hybrid_threshold,
            ..QuerySettings::default()
        },
    );
    let artifacts_dir = cli_args.artifacts_dir.display().to_string();

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<MyHelper, FileHistory>::with_config(config)?;

    let helper = MyHelper::new();
    rl.set_helper(Some(helper));

    loop {
        let readline = rl.readline(PROMPT);

        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &queries, &artifacts_dir, cli_args.edge_sample) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        eprintln!("Error: {}", err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
