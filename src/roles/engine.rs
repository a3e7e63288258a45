use super::assignment::{assign_role, RoleAssignment, HYBRID_THRESHOLD};
use crate::artifacts::{ArtifactStore, IntegrityResult, PlayerSeasonKey};
use std::sync::Arc;
use tracing::debug;

/// Role assignment bound to one cohort's artifacts.
pub struct RoleEngine {
    store: Arc<dyn ArtifactStore>,
    hybrid_threshold: f64,
}

impl RoleEngine {
    pub fn new(store: Arc<dyn ArtifactStore>, hybrid_threshold: f64) -> Self {
        Self {
            store,
            hybrid_threshold,
        }
    }

    pub fn with_default_threshold(store: Arc<dyn ArtifactStore>) -> Self {
        Self::new(store, HYBRID_THRESHOLD)
    }

    /// `Ok(None)` when the player-season has no posterior.
    pub fn role_for(&self, key: PlayerSeasonKey) -> IntegrityResult<Option<RoleAssignment>> {
        let Some(posterior) = self.store.get_posterior(key)? else {
            debug!("No posterior for {}", key);
            return Ok(None);
        };
        let mapping = self.store.load_role_mapping(key.season_id)?;
        let descriptions = self.store.load_role_descriptions(key.season_id)?;
        assign_role(
            key,
            &posterior,
            &mapping,
            &descriptions,
            self.hybrid_threshold,
        )
        .map(Some)
    }

    pub fn has_role_data(&self, key: PlayerSeasonKey) -> IntegrityResult<bool> {
        Ok(self.store.get_posterior(key)?.is_some())
    }
}
