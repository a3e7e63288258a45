mod file_config;

pub use file_config::{CohortFileConfig, FileConfig};

use crate::artifacts::DEFAULT_POSTERIOR_TOLERANCE;
use crate::query::{QuerySettings, DEFAULT_SIMILAR_K, MAX_SIMILAR_K};
use crate::roles::HYBRID_THRESHOLD;
use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_COHORT_NAME: &str = "strikers";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub artifacts_dir: Option<PathBuf>,
    pub cohort_name: String,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub hybrid_threshold: f64,
    pub default_similar_k: usize,
    pub max_similar_k: usize,
    pub posterior_tolerance: f64,
    pub embedding_dim: Option<usize>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: None,
            cohort_name: DEFAULT_COHORT_NAME.to_string(),
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::default(),
            content_cache_age_sec: 3600,
            hybrid_threshold: HYBRID_THRESHOLD,
            default_similar_k: DEFAULT_SIMILAR_K,
            max_similar_k: MAX_SIMILAR_K,
            posterior_tolerance: DEFAULT_POSTERIOR_TOLERANCE,
            embedding_dim: None,
        }
    }
}

/// One cohort's artifact directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortConfig {
    pub name: String,
    pub artifacts_dir: PathBuf,
    pub embedding_dim: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Server settings
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,

    // Artifact and query settings
    pub posterior_tolerance: f64,
    pub query: QuerySettings,
    pub cohorts: Vec<CohortConfig>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);

        let hybrid_threshold = file.hybrid_threshold.unwrap_or(cli.hybrid_threshold);
        if !(hybrid_threshold > 0.0 && hybrid_threshold <= 1.0) {
            bail!(
                "hybrid_threshold must be in (0, 1], got {}",
                hybrid_threshold
            );
        }

        let max_similar_k = file.max_similar_k.unwrap_or(cli.max_similar_k);
        let default_similar_k = file.default_similar_k.unwrap_or(cli.default_similar_k);
        if default_similar_k == 0 || default_similar_k > max_similar_k {
            bail!(
                "default_similar_k must be between 1 and max_similar_k ({}), got {}",
                max_similar_k,
                default_similar_k
            );
        }

        let posterior_tolerance = file.posterior_tolerance.unwrap_or(cli.posterior_tolerance);
        if !(posterior_tolerance >= 0.0 && posterior_tolerance < 1.0) {
            bail!(
                "posterior_tolerance must be in [0, 1), got {}",
                posterior_tolerance
            );
        }

        let embedding_dim = file.embedding_dim.or(cli.embedding_dim);
        let cohorts = match file.cohorts.filter(|c| !c.is_empty()) {
            Some(cohorts) => cohorts
                .into_iter()
                .enumerate()
                .map(|(index, cohort)| resolve_cohort(index, cohort, embedding_dim))
                .collect::<Result<Vec<_>>>()?,
            None => {
                let artifacts_dir = file
                    .artifacts_dir
                    .map(PathBuf::from)
                    .or_else(|| cli.artifacts_dir.clone())
                    .ok_or_else(|| {
                        anyhow!(
                            "artifacts_dir must be specified via --artifacts-dir or in config file"
                        )
                    })?;
                vec![CohortConfig {
                    name: file.cohort_name.unwrap_or_else(|| cli.cohort_name.clone()),
                    artifacts_dir,
                    embedding_dim,
                }]
            }
        };

        let mut names = HashSet::new();
        for cohort in cohorts.iter() {
            validate_artifacts_dir(&cohort.artifacts_dir)?;
            if !names.insert(cohort.name.as_str()) {
                bail!("Duplicate cohort name: {}", cohort.name);
            }
        }

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            content_cache_age_sec,
            posterior_tolerance,
            query: QuerySettings {
                hybrid_threshold,
                default_similar_k,
                max_similar_k,
            },
            cohorts,
        })
    }
}

fn resolve_cohort(
    index: usize,
    cohort: CohortFileConfig,
    embedding_dim: Option<usize>,
) -> Result<CohortConfig> {
    let name = cohort
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| anyhow!("cohorts[{}] is missing a name", index))?;
    let artifacts_dir = cohort
        .artifacts_dir
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Cohort {} is missing artifacts_dir", name))?;
    Ok(CohortConfig {
        name,
        artifacts_dir,
        embedding_dim: cohort.embedding_dim.or(embedding_dim),
    })
}

fn validate_artifacts_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Artifacts directory does not exist: {:?}", path);
    }
    if !path.is_dir() {
        bail!("artifacts_dir is not a directory: {:?}", path);
    }
    Ok(())
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
