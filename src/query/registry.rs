use super::facade::{QuerySettings, RoleQueries};
use crate::artifacts::{FsArtifactStore, StoreSettings};
use crate::config::CohortConfig;
use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Cohorts served by one process, by name.
#[derive(Default)]
pub struct CohortRegistry {
    cohorts: BTreeMap<String, Arc<RoleQueries>>,
}

impl CohortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One filesystem-backed cohort per config entry. Nothing is read
    /// from disk until the first query.
    pub fn from_config(
        cohorts: &[CohortConfig],
        posterior_tolerance: f64,
        settings: QuerySettings,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for cohort in cohorts {
            let store = FsArtifactStore::new(
                &cohort.artifacts_dir,
                StoreSettings {
                    posterior_tolerance,
                    embedding_dim: cohort.embedding_dim,
                    cluster_count: None,
                },
            );
            info!(
                "Registering cohort {} from {:?}",
                cohort.name, cohort.artifacts_dir
            );
            registry.insert(RoleQueries::new(&cohort.name, Arc::new(store), settings))?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, queries: RoleQueries) -> Result<()> {
        let name = queries.cohort().to_string();
        if self.cohorts.contains_key(&name) {
            bail!("Cohort {} registered twice", name);
        }
        self.cohorts.insert(name, Arc::new(queries));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<RoleQueries>> {
        self.cohorts.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.cohorts.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RoleQueries>> {
        self.cohorts.values()
    }

    pub fn len(&self) -> usize {
        self.cohorts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }
}
