use crate::artifacts::DataIntegrityError;
use thiserror::Error;

/// Failure of a public query. Absence is not an error, it is `Ok(None)` or
/// an empty list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    DataIntegrity(#[from] DataIntegrityError),
}
