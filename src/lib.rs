//! Scouting Roles Server Library
//!
//! Serves tactical role assignments and cross-season similar-player lookups
//! from precomputed clustering artifacts. The modules are exposed for the
//! binaries and for testing.

pub mod artifacts;
pub mod check;
pub mod config;
pub mod query;
pub mod roles;
pub mod server;
pub mod similarity;

// Re-export commonly used types for convenience
pub use artifacts::{ArtifactStore, FsArtifactStore, InMemoryArtifactStore, PlayerSeasonKey};
pub use query::{CohortRegistry, QueryError, RoleQueries};
pub use roles::RoleAssignment;
pub use server::{run_server, RequestsLoggingLevel};
pub use similarity::SimilarPlayer;
