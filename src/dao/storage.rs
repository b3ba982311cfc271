use std::error::Error;
use thiserror::Error;

/// Result alias for document store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by document stores regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or failed to answer.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend holds a document that is not a JSON object.
    #[error("malformed document `{id}` in collection `{collection}`")]
    Malformed { collection: String, id: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    pub fn malformed(collection: &str, id: impl Into<String>) -> Self {
        StorageError::Malformed {
            collection: collection.to_string(),
            id: id.into(),
        }
    }
}
