//! Query facade: the two public operations per cohort, plus the cohort registry.

mod error;
mod facade;
mod registry;

pub use error::QueryError;
pub use facade::{QuerySettings, RoleQueries, DEFAULT_SIMILAR_K, MAX_SIMILAR_K};
pub use registry::CohortRegistry;
