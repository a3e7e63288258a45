use super::error::{DataIntegrityError, IntegrityResult};
use super::files::{PosteriorRow, StyleRow};
use super::models::{
    ClusterId, NeighborEdge, PlayerInfo, PlayerSeasonKey, RoleDescriptions, RoleMapping, SeasonId,
};
use super::tables::{GlobalConfig, NeighborTable, SeasonTables, StoreSettings};
use super::trait_def::ArtifactStore;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Fully materialized store, validated once by [`InMemoryArtifactStoreBuilder::build`].
pub struct InMemoryArtifactStore {
    global: Arc<GlobalConfig>,
    seasons: BTreeMap<SeasonId, Arc<SeasonTables>>,
    neighbors: Arc<NeighborTable>,
}

impl InMemoryArtifactStore {
    pub fn builder() -> InMemoryArtifactStoreBuilder {
        InMemoryArtifactStoreBuilder::default()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn global_config(&self) -> IntegrityResult<Arc<GlobalConfig>> {
        Ok(self.global.clone())
    }

    fn season_tables(&self, season_id: SeasonId) -> IntegrityResult<Option<Arc<SeasonTables>>> {
        Ok(self.seasons.get(&season_id).cloned())
    }

    fn neighbor_table(&self) -> IntegrityResult<Arc<NeighborTable>> {
        Ok(self.neighbors.clone())
    }

    fn available_seasons(&self) -> IntegrityResult<Vec<SeasonId>> {
        Ok(self.seasons.keys().copied().collect())
    }

    fn loaded_season_count(&self) -> usize {
        self.seasons.len()
    }
}

#[derive(Default)]
struct SeasonRows {
    role_mapping: Option<RoleMapping>,
    role_descriptions: Option<RoleDescriptions>,
    style_rows: Vec<StyleRow>,
    posterior_rows: Vec<PosteriorRow>,
}

#[derive(Default)]
pub struct InMemoryArtifactStoreBuilder {
    global: GlobalConfig,
    settings: StoreSettings,
    seasons: HashMap<SeasonId, SeasonRows>,
    edges: Vec<NeighborEdge>,
}

impl InMemoryArtifactStoreBuilder {
    pub fn settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn minutes_threshold(mut self, minutes_threshold: u32) -> Self {
        self.global = self.global.with_minutes_threshold(minutes_threshold);
        self
    }

    /// Mapping used by seasons without their own.
    pub fn global_role_mapping(mut self, mapping: RoleMapping) -> Self {
        self.global.role_mapping = Some(Arc::new(mapping));
        self
    }

    pub fn global_role_descriptions(mut self, descriptions: RoleDescriptions) -> Self {
        self.global.role_descriptions = Arc::new(descriptions);
        self
    }

    pub fn season_roles(
        mut self,
        season_id: SeasonId,
        mapping: RoleMapping,
        descriptions: RoleDescriptions,
    ) -> Self {
        let season = self.seasons.entry(season_id).or_default();
        season.role_mapping = Some(mapping);
        season.role_descriptions = Some(descriptions);
        self
    }

    pub fn embedding(mut self, key: PlayerSeasonKey, values: Vec<f64>, info: PlayerInfo) -> Self {
        self.seasons
            .entry(key.season_id)
            .or_default()
            .style_rows
            .push(StyleRow { key, info, values });
        self
    }

    pub fn posterior<I>(mut self, key: PlayerSeasonKey, probabilities: I) -> Self
    where
        I: IntoIterator<Item = (ClusterId, f64)>,
    {
        self.seasons
            .entry(key.season_id)
            .or_default()
            .posterior_rows
            .push(PosteriorRow {
                key,
                probabilities: probabilities.into_iter().collect(),
            });
        self
    }

    /// Appends edges of `source` in the given order, best first.
    pub fn neighbors<I>(mut self, source: PlayerSeasonKey, targets: I) -> Self
    where
        I: IntoIterator<Item = (PlayerSeasonKey, f64)>,
    {
        self.edges
            .extend(targets.into_iter().map(|(target, similarity)| NeighborEdge {
                source,
                target,
                similarity,
            }));
        self
    }

    pub fn build(self) -> IntegrityResult<InMemoryArtifactStore> {
        let global = self.global;
        let mut seasons = BTreeMap::new();
        for (season_id, rows) in self.seasons {
            let role_mapping = match rows.role_mapping {
                Some(mapping) => Arc::new(mapping),
                None => global
                    .role_mapping
                    .clone()
                    .ok_or(DataIntegrityError::NoRoleMapping { season_id })?,
            };
            let role_descriptions = rows
                .role_descriptions
                .map(Arc::new)
                .unwrap_or_else(|| global.role_descriptions.clone());
            let tables = SeasonTables::build(
                season_id,
                role_mapping,
                role_descriptions,
                rows.style_rows,
                rows.posterior_rows,
                &self.settings,
            )?;
            seasons.insert(season_id, Arc::new(tables));
        }
        Ok(InMemoryArtifactStore {
            global: Arc::new(global),
            seasons,
            neighbors: Arc::new(NeighborTable::build(self.edges)?),
        })
    }
}
