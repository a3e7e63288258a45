use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scouting_roles_server::config;
use scouting_roles_server::query::{CohortRegistry, DEFAULT_SIMILAR_K, MAX_SIMILAR_K};
use scouting_roles_server::roles::HYBRID_THRESHOLD;
use scouting_roles_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the cohort's clustering artifacts.
    #[clap(long, value_parser = parse_dir)]
    pub artifacts_dir: Option<PathBuf>,

    /// Name the cohort is served under.
    #[clap(long, default_value = config::DEFAULT_COHORT_NAME)]
    pub cohort_name: String,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of content in the cache in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// Top probability below which a player is flagged as hybrid.
    #[clap(long, default_value_t = HYBRID_THRESHOLD)]
    pub hybrid_threshold: f64,

    /// Number of similar players returned when the request gives none.
    #[clap(long, default_value_t = DEFAULT_SIMILAR_K)]
    pub default_similar_k: usize,

    /// Upper bound for the requested number of similar players.
    #[clap(long, default_value_t = MAX_SIMILAR_K)]
    pub max_similar_k: usize,

    /// Accepted deviation of a posterior row sum from 1.
    #[clap(long, default_value_t = scouting_roles_server::artifacts::DEFAULT_POSTERIOR_TOLERANCE)]
    pub posterior_tolerance: f64,

    /// Expected style vector length. Inferred from the data when unset.
    #[clap(long)]
    pub embedding_dim: Option<usize>,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            artifacts_dir: args.artifacts_dir.clone(),
            cohort_name: args.cohort_name.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            content_cache_age_sec: args.content_cache_age_sec,
            hybrid_threshold: args.hybrid_threshold,
            default_similar_k: args.default_similar_k,
            max_similar_k: args.max_similar_k,
            posterior_tolerance: args.posterior_tolerance,
            embedding_dim: args.embedding_dim,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    for cohort in app_config.cohorts.iter() {
        info!("  cohort {}: {:?}", cohort.name, cohort.artifacts_dir);
    }
    info!("  port: {}", app_config.port);
    info!("  metrics_port: {}", app_config.metrics_port);
    info!("  hybrid_threshold: {}", app_config.query.hybrid_threshold);
    info!(
        "  similar k: default {}, max {}",
        app_config.query.default_similar_k, app_config.query.max_similar_k
    );

    info!("Initializing metrics...");
    metrics::init_metrics();

    let cohorts = Arc::new(CohortRegistry::from_config(
        &app_config.cohorts,
        app_config.posterior_tolerance,
        app_config.query,
    )?);

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        content_cache_age_sec: app_config.content_cache_age_sec,
    };

    tokio::select! {
        result = run_server(cohorts, server_config) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
