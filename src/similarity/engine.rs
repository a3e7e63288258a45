use crate::artifacts::{ArtifactStore, IntegrityResult, PlayerSeasonKey, SeasonId};
use crate::roles::RoleEngine;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, error};

/// One ranked neighbor of a player-season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPlayer {
    pub player_id: u64,
    pub season_id: SeasonId,
    /// Cosine similarity as an integer percent in [0, 100].
    pub similarity: u8,
    pub cosine_similarity: f64,
    pub role: Option<String>,
    pub confidence: Option<f64>,
    pub is_hybrid: Option<bool>,
    pub player_name: Option<String>,
    pub team_id: Option<u64>,
    pub team_name: Option<String>,
}

pub fn similarity_percent(cosine_similarity: f64) -> u8 {
    (cosine_similarity * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Nearest player-seasons across every season of the cohort.
pub struct SimilarityEngine {
    store: Arc<dyn ArtifactStore>,
    roles: Arc<RoleEngine>,
}

impl SimilarityEngine {
    pub fn new(store: Arc<dyn ArtifactStore>, roles: Arc<RoleEngine>) -> Self {
        Self { store, roles }
    }

    /// Up to `k` neighbors of `key`, best first, ties by ascending target.
    ///
    /// The order is the precomputed one. A neighbor without role data is
    /// still returned, with the role fields unset.
    pub fn get_similar(
        &self,
        key: PlayerSeasonKey,
        k: NonZeroUsize,
    ) -> IntegrityResult<Vec<SimilarPlayer>> {
        // One extra edge so that dropping a stray self-edge still fills k.
        let fetch = k.checked_add(1).unwrap_or(k);
        let edges = self.store.get_neighbors(key, fetch)?;
        if edges.is_empty() {
            debug!("No precomputed neighbors for {}", key);
            return Ok(vec![]);
        }

        let mut results = Vec::with_capacity(k.get());
        for edge in edges {
            if edge.target == edge.source {
                error!("Dropping self-referencing neighbor edge of {}", key);
                continue;
            }
            if results.len() == k.get() {
                break;
            }
            let role = self.roles.role_for(edge.target)?;
            let info = self.store.get_player_info(edge.target)?.unwrap_or_default();
            results.push(SimilarPlayer {
                player_id: edge.target.player_id,
                season_id: edge.target.season_id,
                similarity: similarity_percent(edge.similarity),
                cosine_similarity: edge.similarity,
                role: role.as_ref().map(|r| r.role.clone()),
                confidence: role.as_ref().map(|r| r.confidence),
                is_hybrid: role.as_ref().map(|r| r.is_hybrid),
                player_name: info.player_name,
                team_id: info.team_id,
                team_name: info.team_name,
            });
        }
        Ok(results)
    }
}
