use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::storage::UniqueField;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("duplicate {field} rejected by unique index")]
    Duplicate {
        field: UniqueField,
        #[source]
        source: MongoError,
    },
    #[error("failed to save car `{id}`")]
    SaveCar {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load car by {by}")]
    LoadCar {
        by: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to list cars")]
    ListCars {
        #[source]
        source: MongoError,
    },
    #[error("failed to load category `{name}`")]
    LoadCategory {
        name: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to save category `{name}`")]
    SaveCategory {
        name: String,
        #[source]
        source: MongoError,
    },
    #[error("stored document `{id}` is malformed: {reason}")]
    MalformedDocument { id: String, reason: String },
}
