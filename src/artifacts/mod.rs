mod error;
mod files;
mod memory_store;
mod models;
mod store;
mod tables;
mod trait_def;
mod validation;

pub use error::{DataIntegrityError, IntegrityResult};
pub use files::{
    CLUSTER_PROBS_FILE, CONFIG_FILE, NEIGHBORS_FILE, ROLE_DESCRIPTIONS_FILE, ROLE_MAPPING_FILE,
    STYLE_VECTORS_FILE,
};
pub use memory_store::{InMemoryArtifactStore, InMemoryArtifactStoreBuilder};
pub use models::*;
pub use store::FsArtifactStore;
pub use tables::{
    GlobalConfig, NeighborTable, SeasonTables, StoreSettings, DEFAULT_MINUTES_THRESHOLD,
};
pub use trait_def::ArtifactStore;
pub use validation::DEFAULT_POSTERIOR_TOLERANCE;
