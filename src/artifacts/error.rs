//! Integrity failures raised while loading or reading artifacts.
//!
//! Expected absence (a player below the minutes threshold, a season not
//! processed yet) is never an error: stores return `None` or an empty list
//! for those. Everything here means an artifact exists but cannot be trusted.

use super::models::{ClusterId, PlayerSeasonKey, SeasonId};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataIntegrityError {
    #[error("Required artifact is missing: {path:?}")]
    MissingArtifact { path: PathBuf },

    #[error("Could not read artifact {path:?}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Malformed artifact {path:?} at record {record}: {reason}")]
    MalformedRecord {
        path: PathBuf,
        record: usize,
        reason: String,
    },

    #[error("Season {season_id} has no role mapping (no per-season or global cluster_to_role)")]
    NoRoleMapping { season_id: SeasonId },

    #[error("Cluster {cluster} of season {season_id} has no mapped role{}", key_suffix(.key))]
    UnmappedCluster {
        season_id: SeasonId,
        cluster: ClusterId,
        key: Option<PlayerSeasonKey>,
    },

    #[error("Posterior of {key} is malformed: {reason}")]
    MalformedPosterior { key: PlayerSeasonKey, reason: String },

    #[error("Embedding of {key} has {found} dimensions, expected {expected}")]
    EmbeddingDimension {
        key: PlayerSeasonKey,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate {table} row for {key}")]
    DuplicateKey {
        table: &'static str,
        key: PlayerSeasonKey,
    },

    #[error("Row for {key} found in the artifacts of season {directory_season}")]
    SeasonMismatch {
        key: PlayerSeasonKey,
        directory_season: SeasonId,
    },

    #[error("Neighbors of {key} are not sorted by descending similarity")]
    UnsortedNeighbors { key: PlayerSeasonKey },

    #[error("Neighbor edge {source_key} -> {target} has invalid similarity {similarity}")]
    InvalidSimilarity {
        source_key: PlayerSeasonKey,
        target: PlayerSeasonKey,
        similarity: f64,
    },
}

fn key_suffix(key: &Option<PlayerSeasonKey>) -> String {
    match key {
        Some(key) => format!(" (referenced by {})", key),
        None => String::new(),
    }
}

impl DataIntegrityError {
    /// Short, stable label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DataIntegrityError::MissingArtifact { .. } => "missing_artifact",
            DataIntegrityError::Unreadable { .. } => "unreadable",
            DataIntegrityError::MalformedRecord { .. } => "malformed_record",
            DataIntegrityError::NoRoleMapping { .. } => "no_role_mapping",
            DataIntegrityError::UnmappedCluster { .. } => "unmapped_cluster",
            DataIntegrityError::MalformedPosterior { .. } => "malformed_posterior",
            DataIntegrityError::EmbeddingDimension { .. } => "embedding_dimension",
            DataIntegrityError::DuplicateKey { .. } => "duplicate_key",
            DataIntegrityError::SeasonMismatch { .. } => "season_mismatch",
            DataIntegrityError::UnsortedNeighbors { .. } => "unsorted_neighbors",
            DataIntegrityError::InvalidSimilarity { .. } => "invalid_similarity",
        }
    }
}

pub type IntegrityResult<T> = Result<T, DataIntegrityError>;
