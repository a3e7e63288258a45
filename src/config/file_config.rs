use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub artifacts_dir: Option<String>,
    pub cohort_name: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub content_cache_age_sec: Option<usize>,

    // Query settings
    pub hybrid_threshold: Option<f64>,
    pub default_similar_k: Option<usize>,
    pub max_similar_k: Option<usize>,
    pub posterior_tolerance: Option<f64>,
    pub embedding_dim: Option<usize>,

    /// Serve several cohorts instead of the single `artifacts_dir` one.
    pub cohorts: Option<Vec<CohortFileConfig>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CohortFileConfig {
    pub name: Option<String>,
    pub artifacts_dir: Option<String>,
    pub embedding_dim: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
