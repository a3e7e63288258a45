//! Validated, immutable in-memory tables built from artifact rows.

use super::error::{DataIntegrityError, IntegrityResult};
use super::files::{
    self, GlobalConfigFile, PosteriorRow, StyleRow, CLUSTER_PROBS_FILE, CONFIG_FILE,
    ROLE_DESCRIPTIONS_FILE, ROLE_MAPPING_FILE, STYLE_VECTORS_FILE,
};
use super::models::{
    ClusterPosterior, NeighborEdge, PlayerId, PlayerInfo, PlayerSeasonKey, RoleDescriptions,
    RoleMapping, SeasonId, StyleEmbedding,
};
use super::validation::{
    normalize_neighbor_list, validate_embedding, validate_posterior, validate_posterior_mapped,
    validate_similarity, DEFAULT_POSTERIOR_TOLERANCE,
};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_MINUTES_THRESHOLD: u32 = 500;

/// Knobs applied while validating loaded tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreSettings {
    pub posterior_tolerance: f64,
    /// Overrides the dimension recorded in `config.json`.
    pub embedding_dim: Option<usize>,
    /// Expected number of cluster columns per posterior.
    pub cluster_count: Option<usize>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            posterior_tolerance: DEFAULT_POSTERIOR_TOLERANCE,
            embedding_dim: None,
            cluster_count: None,
        }
    }
}

/// Cohort-wide configuration, the fallback for per-season files.
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub role_mapping: Option<Arc<RoleMapping>>,
    pub role_descriptions: Arc<RoleDescriptions>,
    pub minutes_threshold: u32,
    pub embedding_dim: Option<usize>,
    pub cluster_count: Option<usize>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            role_mapping: None,
            role_descriptions: Arc::new(RoleDescriptions::default()),
            minutes_threshold: DEFAULT_MINUTES_THRESHOLD,
            embedding_dim: None,
            cluster_count: None,
        }
    }
}

impl GlobalConfig {
    pub fn load(root: &Path) -> IntegrityResult<Self> {
        let path = root.join(CONFIG_FILE);
        let raw: GlobalConfigFile = files::read_json(&path)?.unwrap_or_default();
        let role_mapping = match raw.cluster_to_role {
            Some(mapping) => Some(Arc::new(files::parse_role_mapping(&path, mapping)?)),
            None => None,
        };
        Ok(Self {
            role_mapping,
            role_descriptions: Arc::new(RoleDescriptions::new(
                raw.role_descriptions.unwrap_or_default(),
            )),
            minutes_threshold: raw.minutes_threshold.unwrap_or(DEFAULT_MINUTES_THRESHOLD),
            embedding_dim: raw.n_components_pca,
            cluster_count: raw.n_clusters_gmm,
        })
    }

    pub fn with_minutes_threshold(mut self, minutes_threshold: u32) -> Self {
        self.minutes_threshold = minutes_threshold;
        self
    }
}

/// Everything known about one season.
#[derive(Debug)]
pub struct SeasonTables {
    pub season_id: SeasonId,
    pub role_mapping: Arc<RoleMapping>,
    pub role_descriptions: Arc<RoleDescriptions>,
    embeddings: HashMap<PlayerId, StyleEmbedding>,
    posteriors: HashMap<PlayerId, ClusterPosterior>,
    players: HashMap<PlayerId, PlayerInfo>,
}

impl SeasonTables {
    /// Reads the season directory, falling back to the global config for
    /// the role mapping and descriptions.
    pub fn load(
        dir: &Path,
        season_id: SeasonId,
        global: &GlobalConfig,
        settings: &StoreSettings,
    ) -> IntegrityResult<Self> {
        let mapping_path = dir.join(ROLE_MAPPING_FILE);
        let role_mapping = match files::read_json(&mapping_path)? {
            Some(raw) => Arc::new(files::parse_role_mapping(&mapping_path, raw)?),
            None => global
                .role_mapping
                .clone()
                .ok_or(DataIntegrityError::NoRoleMapping { season_id })?,
        };
        let role_descriptions = match files::read_json(&dir.join(ROLE_DESCRIPTIONS_FILE))? {
            Some(raw) => Arc::new(RoleDescriptions::new(raw)),
            None => global.role_descriptions.clone(),
        };

        let style_rows = files::read_style_vectors(&dir.join(STYLE_VECTORS_FILE))?;
        let posterior_rows = files::read_cluster_probs(&dir.join(CLUSTER_PROBS_FILE))?;

        let settings = StoreSettings {
            embedding_dim: settings.embedding_dim.or(global.embedding_dim),
            cluster_count: settings.cluster_count.or(global.cluster_count),
            ..*settings
        };
        Self::build(
            season_id,
            role_mapping,
            role_descriptions,
            style_rows,
            posterior_rows,
            &settings,
        )
    }

    pub fn build(
        season_id: SeasonId,
        role_mapping: Arc<RoleMapping>,
        role_descriptions: Arc<RoleDescriptions>,
        style_rows: Vec<StyleRow>,
        posterior_rows: Vec<PosteriorRow>,
        settings: &StoreSettings,
    ) -> IntegrityResult<Self> {
        let mut embeddings = HashMap::with_capacity(style_rows.len());
        let mut players = HashMap::with_capacity(style_rows.len());
        let mut expected_dim = settings.embedding_dim;

        for row in style_rows {
            check_season(row.key, season_id)?;
            let embedding = validate_embedding(row.key, row.values, expected_dim)?;
            expected_dim.get_or_insert(embedding.dims());
            match embeddings.entry(row.key.player_id) {
                Entry::Occupied(_) => {
                    return Err(DataIntegrityError::DuplicateKey {
                        table: "style vectors",
                        key: row.key,
                    })
                }
                Entry::Vacant(slot) => {
                    slot.insert(embedding);
                }
            }
            players.insert(row.key.player_id, row.info);
        }

        let mut posteriors = HashMap::with_capacity(posterior_rows.len());
        for row in posterior_rows {
            check_season(row.key, season_id)?;
            let posterior =
                validate_posterior(row.key, row.probabilities, settings.posterior_tolerance)?;
            if let Some(expected) = settings.cluster_count {
                if posterior.len() != expected {
                    return Err(DataIntegrityError::MalformedPosterior {
                        key: row.key,
                        reason: format!("{} clusters, expected {}", posterior.len(), expected),
                    });
                }
            }
            validate_posterior_mapped(row.key, &posterior, &role_mapping)?;
            if posteriors.insert(row.key.player_id, posterior).is_some() {
                return Err(DataIntegrityError::DuplicateKey {
                    table: "cluster probabilities",
                    key: row.key,
                });
            }
        }

        Ok(Self {
            season_id,
            role_mapping,
            role_descriptions,
            embeddings,
            posteriors,
            players,
        })
    }

    pub fn embedding(&self, player_id: PlayerId) -> Option<&StyleEmbedding> {
        self.embeddings.get(&player_id)
    }

    pub fn posterior(&self, player_id: PlayerId) -> Option<&ClusterPosterior> {
        self.posteriors.get(&player_id)
    }

    pub fn player_info(&self, player_id: PlayerId) -> Option<&PlayerInfo> {
        self.players.get(&player_id)
    }

    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }

    pub fn posterior_count(&self) -> usize {
        self.posteriors.len()
    }

    /// Player ids with an embedding, ascending.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.embeddings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

fn check_season(key: PlayerSeasonKey, season_id: SeasonId) -> IntegrityResult<()> {
    if key.season_id != season_id {
        return Err(DataIntegrityError::SeasonMismatch {
            key,
            directory_season: season_id,
        });
    }
    Ok(())
}

/// Cross-season neighbor lists, grouped by source key.
#[derive(Debug, Default)]
pub struct NeighborTable {
    by_source: HashMap<PlayerSeasonKey, Vec<NeighborEdge>>,
}

impl NeighborTable {
    pub fn load(path: &Path) -> IntegrityResult<Self> {
        Self::build(files::read_neighbors(path)?)
    }

    /// Groups edges by source, preserving file order within a group.
    pub fn build(edges: Vec<NeighborEdge>) -> IntegrityResult<Self> {
        let mut by_source: HashMap<PlayerSeasonKey, Vec<NeighborEdge>> = HashMap::new();
        for edge in edges {
            validate_similarity(&edge)?;
            by_source.entry(edge.source).or_default().push(edge);
        }
        for (key, list) in by_source.iter_mut() {
            normalize_neighbor_list(*key, list)?;
        }
        Ok(Self { by_source })
    }

    /// Up to `top_k` edges of `key`, best first. Never re-sorts.
    pub fn top(&self, key: PlayerSeasonKey, top_k: NonZeroUsize) -> &[NeighborEdge] {
        match self.by_source.get(&key) {
            Some(list) => &list[..list.len().min(top_k.get())],
            None => &[],
        }
    }

    pub fn source_count(&self) -> usize {
        self.by_source.len()
    }

    pub fn edge_count(&self) -> usize {
        self.by_source.values().map(Vec::len).sum()
    }

    /// All edges, sources ascending.
    pub fn edges(&self) -> Vec<NeighborEdge> {
        let sorted: BTreeMap<_, _> = self.by_source.iter().collect();
        sorted.into_values().flatten().copied().collect()
    }
}
