use super::error::QueryError;
use crate::artifacts::{ArtifactStore, DataIntegrityError, PlayerSeasonKey, SeasonId};
use crate::roles::{RoleAssignment, RoleEngine, HYBRID_THRESHOLD};
use crate::server::metrics;
use crate::similarity::{SimilarPlayer, SimilarityEngine};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::error;

pub const DEFAULT_SIMILAR_K: usize = 5;
pub const MAX_SIMILAR_K: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuerySettings {
    pub hybrid_threshold: f64,
    pub default_similar_k: usize,
    pub max_similar_k: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            hybrid_threshold: HYBRID_THRESHOLD,
            default_similar_k: DEFAULT_SIMILAR_K,
            max_similar_k: MAX_SIMILAR_K,
        }
    }
}

/// Public operations over one cohort.
///
/// Integrity failures are logged with the offending key and counted before
/// being returned, never replaced by a default.
pub struct RoleQueries {
    cohort: String,
    store: Arc<dyn ArtifactStore>,
    roles: Arc<RoleEngine>,
    similarity: SimilarityEngine,
    settings: QuerySettings,
}

impl RoleQueries {
    pub fn new<S: Into<String>>(
        cohort: S,
        store: Arc<dyn ArtifactStore>,
        settings: QuerySettings,
    ) -> Self {
        let roles = Arc::new(RoleEngine::new(store.clone(), settings.hybrid_threshold));
        let similarity = SimilarityEngine::new(store.clone(), roles.clone());
        Self {
            cohort: cohort.into(),
            store,
            roles,
            similarity,
            settings,
        }
    }

    pub fn cohort(&self) -> &str {
        &self.cohort
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    pub fn get_role(&self, key: PlayerSeasonKey) -> Result<Option<RoleAssignment>, QueryError> {
        let result = self.roles.role_for(key);
        self.refresh_loaded_seasons();
        match result {
            Ok(Some(assignment)) => {
                metrics::record_role_query(&self.cohort, "found");
                Ok(Some(assignment))
            }
            Ok(None) => {
                metrics::record_role_query(&self.cohort, "absent");
                Ok(None)
            }
            Err(err) => {
                metrics::record_role_query(&self.cohort, "error");
                Err(self.integrity_failure(key, err))
            }
        }
    }

    /// Similar player-seasons of `key`. `k` defaults to the configured
    /// value and is capped at the configured maximum; zero is rejected.
    pub fn get_similar(
        &self,
        key: PlayerSeasonKey,
        k: Option<usize>,
    ) -> Result<Vec<SimilarPlayer>, QueryError> {
        let requested = k.unwrap_or(self.settings.default_similar_k);
        let Some(k) = NonZeroUsize::new(requested.min(self.settings.max_similar_k)) else {
            metrics::record_similar_query(&self.cohort, "invalid", 0);
            return Err(QueryError::InvalidArgument(format!(
                "k must be a positive integer, got {}",
                requested
            )));
        };

        let result = self.similarity.get_similar(key, k);
        self.refresh_loaded_seasons();
        match result {
            Ok(similar) => {
                let outcome = if similar.is_empty() { "absent" } else { "found" };
                metrics::record_similar_query(&self.cohort, outcome, similar.len());
                Ok(similar)
            }
            Err(err) => {
                metrics::record_similar_query(&self.cohort, "error", 0);
                Err(self.integrity_failure(key, err))
            }
        }
    }

    pub fn has_role_data(&self, key: PlayerSeasonKey) -> Result<bool, QueryError> {
        self.roles
            .has_role_data(key)
            .map_err(|err| self.integrity_failure(key, err))
    }

    pub fn minutes_threshold(&self) -> Result<u32, QueryError> {
        self.store.minutes_threshold().map_err(|err| {
            error!("Cohort {}: {}", self.cohort, err);
            metrics::record_integrity_error(&self.cohort, err.kind());
            QueryError::DataIntegrity(err)
        })
    }

    pub fn available_seasons(&self) -> Result<Vec<SeasonId>, QueryError> {
        self.store.available_seasons().map_err(|err| {
            error!("Cohort {}: {}", self.cohort, err);
            metrics::record_integrity_error(&self.cohort, err.kind());
            QueryError::DataIntegrity(err)
        })
    }

    pub fn loaded_season_count(&self) -> usize {
        self.store.loaded_season_count()
    }

    fn integrity_failure(&self, key: PlayerSeasonKey, err: DataIntegrityError) -> QueryError {
        error!("Cohort {}, {}: {}", self.cohort, key, err);
        metrics::record_integrity_error(&self.cohort, err.kind());
        QueryError::DataIntegrity(err)
    }

    fn refresh_loaded_seasons(&self) {
        metrics::set_loaded_seasons(&self.cohort, self.store.loaded_season_count());
    }
}
