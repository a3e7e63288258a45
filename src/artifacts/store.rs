use super::error::{DataIntegrityError, IntegrityResult};
use super::files::NEIGHBORS_FILE;
use super::models::SeasonId;
use super::tables::{GlobalConfig, NeighborTable, SeasonTables, StoreSettings};
use super::trait_def::ArtifactStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info};

type SeasonSlot = Arc<OnceLock<IntegrityResult<Option<Arc<SeasonTables>>>>>;

/// Artifact store reading one cohort directory lazily.
///
/// Each season is loaded on first use and kept for the process lifetime.
/// Failed loads are cached too, so a broken season keeps failing the same
/// way without re-reading its files and without affecting other seasons.
pub struct FsArtifactStore {
    root: PathBuf,
    settings: StoreSettings,
    global: OnceLock<IntegrityResult<Arc<GlobalConfig>>>,
    neighbors: OnceLock<IntegrityResult<Arc<NeighborTable>>>,
    seasons: Mutex<HashMap<SeasonId, SeasonSlot>>,
    season_loads: AtomicUsize,
}

impl FsArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P, settings: StoreSettings) -> Self {
        Self {
            root: root.as_ref().to_owned(),
            settings,
            global: OnceLock::new(),
            neighbors: OnceLock::new(),
            seasons: Mutex::new(HashMap::new()),
            season_loads: AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn season_slot(&self, season_id: SeasonId) -> SeasonSlot {
        // Only slot creation happens under the lock; the load itself runs
        // inside the slot's OnceLock so other seasons are never blocked.
        let mut seasons = self.seasons.lock().unwrap_or_else(PoisonError::into_inner);
        seasons.entry(season_id).or_default().clone()
    }

    fn load_season(
        &self,
        season_id: SeasonId,
        global: &GlobalConfig,
    ) -> IntegrityResult<Option<Arc<SeasonTables>>> {
        let dir = self.root.join(season_id.to_string());
        if !dir.is_dir() {
            debug!("No artifacts for season {} in {:?}", season_id, self.root);
            return Ok(None);
        }

        let start = Instant::now();
        self.season_loads.fetch_add(1, Ordering::SeqCst);
        match SeasonTables::load(&dir, season_id, global, &self.settings) {
            Ok(tables) => {
                info!(
                    "Loaded season {}: {} style vectors, {} posteriors, {} roles in {:?}",
                    season_id,
                    tables.embedding_count(),
                    tables.posterior_count(),
                    tables.role_mapping.len(),
                    start.elapsed()
                );
                Ok(Some(Arc::new(tables)))
            }
            Err(err) => {
                error!("Failed to load season {}: {}", season_id, err);
                Err(err)
            }
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn global_config(&self) -> IntegrityResult<Arc<GlobalConfig>> {
        self.global
            .get_or_init(|| {
                GlobalConfig::load(&self.root).map(Arc::new).inspect_err(|err| {
                    error!("Failed to load cohort config in {:?}: {}", self.root, err)
                })
            })
            .clone()
    }

    fn season_tables(&self, season_id: SeasonId) -> IntegrityResult<Option<Arc<SeasonTables>>> {
        let global = self.global_config()?;
        self.season_slot(season_id)
            .get_or_init(|| self.load_season(season_id, &global))
            .clone()
    }

    fn neighbor_table(&self) -> IntegrityResult<Arc<NeighborTable>> {
        self.neighbors
            .get_or_init(|| {
                let start = Instant::now();
                let path = self.root.join(NEIGHBORS_FILE);
                match NeighborTable::load(&path) {
                    Ok(table) => {
                        info!(
                            "Loaded neighbor table: {} edges for {} player-seasons in {:?}",
                            table.edge_count(),
                            table.source_count(),
                            start.elapsed()
                        );
                        Ok(Arc::new(table))
                    }
                    Err(err) => {
                        error!("Failed to load neighbor table: {}", err);
                        Err(err)
                    }
                }
            })
            .clone()
    }

    fn available_seasons(&self) -> IntegrityResult<Vec<SeasonId>> {
        let unreadable = |err: std::io::Error| DataIntegrityError::Unreadable {
            path: self.root.clone(),
            reason: err.to_string(),
        };
        let mut seasons = vec![];
        for entry in std::fs::read_dir(&self.root).map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(season_id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<SeasonId>().ok())
            {
                seasons.push(season_id);
            }
        }
        seasons.sort_unstable();
        Ok(seasons)
    }

    fn loaded_season_count(&self) -> usize {
        self.season_loads.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::files::{CLUSTER_PROBS_FILE, CONFIG_FILE, STYLE_VECTORS_FILE};
    use crate::artifacts::models::PlayerSeasonKey;
    use std::fs;
    use std::num::NonZeroUsize;
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "cluster_to_role": {"0": "Link-Up / Complete Striker", "1": "Pressing Striker", "2": "Poacher"},
        "role_descriptions": {"Poacher": "Focuses on box occupation and finishing, limited link play."},
        "minutes_threshold": 500,
        "n_components_pca": 2
    }"#;

    fn write_season(root: &Path, season_id: SeasonId, probs: &str) {
        let dir = root.join(season_id.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(STYLE_VECTORS_FILE),
            format!(
                "player_id,season_id,player_name,pca_1,pca_2\n1001,{s},Alpha,0.1,0.2\n1002,{s},Beta,0.3,0.4\n",
                s = season_id
            ),
        )
        .unwrap();
        fs::write(dir.join(CLUSTER_PROBS_FILE), probs).unwrap();
    }

    fn cohort() -> TempDir {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join(CONFIG_FILE), CONFIG).unwrap();
        write_season(
            root.path(),
            317,
            "player_id,season_id,cluster_0,cluster_1,cluster_2\n1001,317,0.75,0.15,0.10\n",
        );
        fs::write(
            root.path().join(NEIGHBORS_FILE),
            "anchor_player_id,anchor_season_id,neighbor_player_id,neighbor_season_id,cosine_sim\n\
             1001,317,1002,317,0.9\n",
        )
        .unwrap();
        root
    }

    #[test]
    fn serves_lookups_from_disk() {
        let root = cohort();
        let store = FsArtifactStore::new(root.path(), StoreSettings::default());
        let key = PlayerSeasonKey::new(1001, 317);

        assert_eq!(store.get_embedding(key).unwrap().unwrap().dims(), 2);
        assert_eq!(store.get_posterior(key).unwrap().unwrap().probability(0), Some(0.75));
        assert_eq!(
            store.get_player_info(key).unwrap().unwrap().player_name.as_deref(),
            Some("Alpha")
        );
        assert!(store.get_posterior(PlayerSeasonKey::new(1002, 317)).unwrap().is_none());
        assert_eq!(store.minutes_threshold().unwrap(), 500);
        assert_eq!(
            store.load_role_descriptions(317).unwrap().describe("Poacher"),
            "Focuses on box occupation and finishing, limited link play."
        );
        assert_eq!(store.load_role_descriptions(317).unwrap().describe("Pressing Striker"), "");
        assert_eq!(
            store
                .get_neighbors(key, NonZeroUsize::new(5).unwrap())
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn unprocessed_season_is_absent() {
        let root = cohort();
        let store = FsArtifactStore::new(root.path(), StoreSettings::default());
        let key = PlayerSeasonKey::new(1001, 999);
        assert!(store.get_embedding(key).unwrap().is_none());
        assert!(store.get_posterior(key).unwrap().is_none());
        assert_eq!(store.loaded_season_count(), 0);
    }

    #[test]
    fn broken_season_does_not_block_other_seasons() {
        let root = cohort();
        write_season(
            root.path(),
            318,
            "player_id,season_id,cluster_0,cluster_1,cluster_2\n1001,318,0.5,0.1,0.1\n",
        );
        let store = FsArtifactStore::new(root.path(), StoreSettings::default());

        let err = store.get_posterior(PlayerSeasonKey::new(1001, 318)).unwrap_err();
        assert!(matches!(err, DataIntegrityError::MalformedPosterior { .. }));
        // cached failure, no second read
        assert!(store.get_posterior(PlayerSeasonKey::new(1002, 318)).is_err());
        assert!(store
            .get_posterior(PlayerSeasonKey::new(1001, 317))
            .unwrap()
            .is_some());
        assert_eq!(store.loaded_season_count(), 2);
        assert_eq!(store.available_seasons().unwrap(), vec![317, 318]);
    }

    #[test]
    fn missing_neighbor_table_fails_only_neighbor_lookups() {
        let root = cohort();
        fs::remove_file(root.path().join(NEIGHBORS_FILE)).unwrap();
        let store = FsArtifactStore::new(root.path(), StoreSettings::default());
        let key = PlayerSeasonKey::new(1001, 317);

        assert!(store.get_posterior(key).unwrap().is_some());
        let err = store
            .get_neighbors(key, NonZeroUsize::new(3).unwrap())
            .unwrap_err();
        assert!(matches!(err, DataIntegrityError::MissingArtifact { .. }));
    }

    #[test]
    fn concurrent_first_access_loads_season_once() {
        let root = cohort();
        let store = Arc::new(FsArtifactStore::new(root.path(), StoreSettings::default()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .get_posterior(PlayerSeasonKey::new(1001, 317))
                        .unwrap()
                        .unwrap()
                })
            })
            .collect();
        let posteriors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(store.loaded_season_count(), 1);
        assert!(posteriors.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn configured_dimension_overrides_cohort_config() {
        let root = cohort();
        let store = FsArtifactStore::new(
            root.path(),
            StoreSettings {
                embedding_dim: Some(7),
                ..StoreSettings::default()
            },
        );
        let err = store
            .get_embedding(PlayerSeasonKey::new(1001, 317))
            .unwrap_err();
        assert!(matches!(err, DataIntegrityError::EmbeddingDimension { .. }));
    }
}
