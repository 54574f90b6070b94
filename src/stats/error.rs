use thiserror::Error;

use crate::fsutil::FileReadError;

/// A configured stat source could not be read during a poll cycle.
///
/// The owning task treats this as the entity being gone.
#[derive(Debug, Error)]
#[error("failed to poll `{file_name}` of entity `{entity}`: {source}")]
pub struct StatReadError {
    pub entity: String,
    pub file_name: &'static str,
    #[source]
    pub source: FileReadError,
}
