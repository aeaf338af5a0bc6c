use std::{error::Error, fmt};
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Car attribute that storage keeps unique, ignoring case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Vin,
    RegistrationNumber,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Vin => f.write_str("vin"),
            UniqueField::RegistrationNumber => f.write_str("registration number"),
        }
    }
}

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Insert rejected because another car already holds the value.
    #[error("a car with the same {field} is already stored")]
    Conflict { field: UniqueField },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a uniqueness violation for `field`.
    pub fn conflict(field: UniqueField) -> Self {
        StorageError::Conflict { field }
    }
}
