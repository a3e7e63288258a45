//! Eager verification of a cohort's artifacts.
//!
//! Serving loads lazily and stops at the first broken table. This walks
//! everything up front and collects every problem it can find.

use crate::artifacts::{ArtifactStore, DataIntegrityError, PlayerSeasonKey, SeasonId};
use crate::similarity::cosine_similarity;
use std::fmt;
use tracing::info;

/// Largest accepted gap between a stored similarity and one recomputed from
/// the current embeddings.
pub const DRIFT_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactProblem {
    Integrity(DataIntegrityError),
    SelfEdge {
        key: PlayerSeasonKey,
    },
    /// Edge whose target has no embedding any more.
    DanglingNeighbor {
        source: PlayerSeasonKey,
        target: PlayerSeasonKey,
    },
    SimilarityDrift {
        source: PlayerSeasonKey,
        target: PlayerSeasonKey,
        stored: f64,
        recomputed: f64,
    },
}

impl fmt::Display for ArtifactProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactProblem::Integrity(err) => write!(f, "{}", err),
            ArtifactProblem::SelfEdge { key } => write!(f, "{} lists itself as a neighbor", key),
            ArtifactProblem::DanglingNeighbor { source, target } => {
                write!(f, "{} -> {}: target has no style vector", source, target)
            }
            ArtifactProblem::SimilarityDrift {
                source,
                target,
                stored,
                recomputed,
            } => write!(
                f,
                "{} -> {}: stored similarity {:.4}, embeddings give {:.4}",
                source, target, stored, recomputed
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonSummary {
    pub season_id: SeasonId,
    pub style_vectors: usize,
    pub posteriors: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub seasons: Vec<SeasonSummary>,
    pub neighbor_edges: usize,
    pub checked_edges: usize,
    pub problems: Vec<ArtifactProblem>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Loads every season and the neighbor table, then recomputes the
/// similarity of up to `edge_sample` evenly spread edges.
pub fn check_artifacts(store: &dyn ArtifactStore, edge_sample: usize) -> CheckReport {
    let mut report = CheckReport::default();

    let seasons = match store.available_seasons() {
        Ok(seasons) => seasons,
        Err(err) => {
            report.problems.push(ArtifactProblem::Integrity(err));
            return report;
        }
    };

    info!("Checking {} seasons...", seasons.len());
    for season_id in seasons {
        match store.season_tables(season_id) {
            Ok(Some(tables)) => report.seasons.push(SeasonSummary {
                season_id,
                style_vectors: tables.embedding_count(),
                posteriors: tables.posterior_count(),
            }),
            Ok(None) => {}
            Err(err) => report.problems.push(ArtifactProblem::Integrity(err)),
        }
    }

    let table = match store.neighbor_table() {
        Ok(table) => table,
        Err(err) => {
            report.problems.push(ArtifactProblem::Integrity(err));
            return report;
        }
    };
    let edges = table.edges();
    report.neighbor_edges = edges.len();

    for edge in edges.iter().filter(|e| e.source == e.target) {
        report
            .problems
            .push(ArtifactProblem::SelfEdge { key: edge.source });
    }

    if edge_sample == 0 || edges.is_empty() {
        return report;
    }
    let step = (edges.len() / edge_sample).max(1);
    info!(
        "Recomputing similarity of {} of {} neighbor edges...",
        edges.len().div_ceil(step).min(edge_sample),
        edges.len()
    );
    for edge in edges.iter().step_by(step).take(edge_sample) {
        report.checked_edges += 1;
        let pair = store
            .get_embedding(edge.source)
            .and_then(|source| Ok((source, store.get_embedding(edge.target)?)));
        let (source, target) = match pair {
            Ok((Some(source), Some(target))) => (source, target),
            Ok((_, None)) => {
                report.problems.push(ArtifactProblem::DanglingNeighbor {
                    source: edge.source,
                    target: edge.target,
                });
                continue;
            }
            // A source without an embedding cannot be verified, but its
            // edges are still valid data.
            Ok((None, Some(_))) => continue,
            // Season failures were already reported above.
            Err(_) => continue,
        };
        if let Some(recomputed) = cosine_similarity(&source, &target) {
            if (recomputed - edge.similarity).abs() > DRIFT_TOLERANCE {
                report.problems.push(ArtifactProblem::SimilarityDrift {
                    source: edge.source,
                    target: edge.target,
                    stored: edge.similarity,
                    recomputed,
                });
            }
        }
    }

    report
}
