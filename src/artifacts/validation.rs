//! Validation applied once, when artifact tables are loaded.
//!
//! Values handed out by a store have already passed these checks, so the
//! engines never re-validate on access.

use super::error::{DataIntegrityError, IntegrityResult};
use super::models::{
    ClusterId, ClusterPosterior, NeighborEdge, PlayerSeasonKey, RoleMapping, StyleEmbedding,
};
use std::collections::BTreeMap;

/// Default tolerance on `sum(p) == 1`.
pub const DEFAULT_POSTERIOR_TOLERANCE: f64 = 1e-3;

/// Slack allowed on cosine similarities slightly outside [-1, 1].
const SIMILARITY_SLACK: f64 = 1e-6;

pub fn validate_posterior(
    key: PlayerSeasonKey,
    probabilities: BTreeMap<ClusterId, f64>,
    tolerance: f64,
) -> IntegrityResult<ClusterPosterior> {
    if probabilities.is_empty() {
        return Err(DataIntegrityError::MalformedPosterior {
            key,
            reason: "no cluster probabilities".to_string(),
        });
    }
    for (cluster, p) in probabilities.iter() {
        if !p.is_finite() || *p < -tolerance || *p > 1.0 + tolerance {
            return Err(DataIntegrityError::MalformedPosterior {
                key,
                reason: format!("cluster {} has probability {}", cluster, p),
            });
        }
    }
    let sum: f64 = probabilities.values().sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(DataIntegrityError::MalformedPosterior {
            key,
            reason: format!("probabilities sum to {}", sum),
        });
    }
    // Values inside the tolerance band but outside [0, 1] are pinned to it.
    let probabilities = probabilities
        .into_iter()
        .map(|(cluster, p)| (cluster, p.clamp(0.0, 1.0)))
        .collect();
    Ok(ClusterPosterior::from_validated(probabilities))
}

pub fn validate_embedding(
    key: PlayerSeasonKey,
    values: Vec<f64>,
    expected_dims: Option<usize>,
) -> IntegrityResult<StyleEmbedding> {
    if let Some(expected) = expected_dims {
        if values.len() != expected {
            return Err(DataIntegrityError::EmbeddingDimension {
                key,
                expected,
                found: values.len(),
            });
        }
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(DataIntegrityError::EmbeddingDimension {
            key,
            expected: expected_dims.unwrap_or(values.len()),
            found: values.iter().filter(|v| v.is_finite()).count(),
        });
    }
    Ok(StyleEmbedding::new(values))
}

/// Every cluster the posterior mentions must have a role.
pub fn validate_posterior_mapped(
    key: PlayerSeasonKey,
    posterior: &ClusterPosterior,
    mapping: &RoleMapping,
) -> IntegrityResult<()> {
    match posterior.clusters().find(|c| !mapping.contains(*c)) {
        Some(cluster) => Err(DataIntegrityError::UnmappedCluster {
            season_id: key.season_id,
            cluster,
            key: Some(key),
        }),
        None => Ok(()),
    }
}

pub fn validate_similarity(edge: &NeighborEdge) -> IntegrityResult<()> {
    let s = edge.similarity;
    if !s.is_finite() || s.abs() > 1.0 + SIMILARITY_SLACK {
        return Err(DataIntegrityError::InvalidSimilarity {
            source_key: edge.source,
            target: edge.target,
            similarity: s,
        });
    }
    Ok(())
}

/// Checks that one source's edges are non-increasing, then orders runs of
/// equal similarity by ascending target key.
///
/// Only equal-similarity runs move, so the precomputed ranking is kept and
/// truncating the list afterwards yields a deterministic total order.
pub fn normalize_neighbor_list(
    key: PlayerSeasonKey,
    edges: &mut [NeighborEdge],
) -> IntegrityResult<()> {
    if edges
        .windows(2)
        .any(|pair| pair[1].similarity > pair[0].similarity)
    {
        return Err(DataIntegrityError::UnsortedNeighbors { key });
    }
    let mut start = 0;
    while start < edges.len() {
        let mut end = start + 1;
        while end < edges.len() && edges[end].similarity == edges[start].similarity {
            end += 1;
        }
        edges[start..end].sort_by_key(|edge| edge.target);
        start = end;
    }
    Ok(())
}
