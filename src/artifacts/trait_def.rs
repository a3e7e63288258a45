//! ArtifactStore trait definition.
//!
//! Implementations supply the cached tables; the lookups used by the
//! engines are provided on top of them so every backend resolves absence
//! and integrity failures the same way.

use super::error::{DataIntegrityError, IntegrityResult};
use super::models::{
    ClusterPosterior, NeighborEdge, PlayerInfo, PlayerSeasonKey, RoleDescriptions, RoleMapping,
    SeasonId, StyleEmbedding,
};
use super::tables::{GlobalConfig, NeighborTable, SeasonTables};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Read-only access to the precomputed artifacts of one cohort.
pub trait ArtifactStore: Send + Sync {
    // =========================================================================
    // Cached tables
    // =========================================================================

    /// Cohort-wide configuration. Loaded once.
    fn global_config(&self) -> IntegrityResult<Arc<GlobalConfig>>;

    /// Tables of one season, `None` if the season was never processed.
    ///
    /// Loaded at most once per process; concurrent first callers share the
    /// same load.
    fn season_tables(&self, season_id: SeasonId) -> IntegrityResult<Option<Arc<SeasonTables>>>;

    /// The cross-season neighbor table. Loaded once.
    fn neighbor_table(&self) -> IntegrityResult<Arc<NeighborTable>>;

    /// Seasons present in the store, ascending.
    fn available_seasons(&self) -> IntegrityResult<Vec<SeasonId>>;

    /// Number of season loads performed so far.
    fn loaded_season_count(&self) -> usize;

    // =========================================================================
    // Lookups
    // =========================================================================

    fn load_role_mapping(&self, season_id: SeasonId) -> IntegrityResult<Arc<RoleMapping>> {
        match self.season_tables(season_id)? {
            Some(tables) => Ok(tables.role_mapping.clone()),
            None => self
                .global_config()?
                .role_mapping
                .clone()
                .ok_or(DataIntegrityError::NoRoleMapping { season_id }),
        }
    }

    fn load_role_descriptions(&self, season_id: SeasonId) -> IntegrityResult<Arc<RoleDescriptions>> {
        match self.season_tables(season_id)? {
            Some(tables) => Ok(tables.role_descriptions.clone()),
            None => Ok(self.global_config()?.role_descriptions.clone()),
        }
    }

    fn get_embedding(&self, key: PlayerSeasonKey) -> IntegrityResult<Option<StyleEmbedding>> {
        Ok(self
            .season_tables(key.season_id)?
            .and_then(|tables| tables.embedding(key.player_id).cloned()))
    }

    fn get_posterior(&self, key: PlayerSeasonKey) -> IntegrityResult<Option<ClusterPosterior>> {
        Ok(self
            .season_tables(key.season_id)?
            .and_then(|tables| tables.posterior(key.player_id).cloned()))
    }

    fn get_player_info(&self, key: PlayerSeasonKey) -> IntegrityResult<Option<PlayerInfo>> {
        Ok(self
            .season_tables(key.season_id)?
            .and_then(|tables| tables.player_info(key.player_id).cloned()))
    }

    /// Up to `top_k` precomputed edges, best first. Fewer (or none) when the
    /// table holds fewer.
    fn get_neighbors(
        &self,
        key: PlayerSeasonKey,
        top_k: NonZeroUsize,
    ) -> IntegrityResult<Vec<NeighborEdge>> {
        Ok(self.neighbor_table()?.top(key, top_k).to_vec())
    }

    fn minutes_threshold(&self) -> IntegrityResult<u32> {
        Ok(self.global_config()?.minutes_threshold)
    }
}
