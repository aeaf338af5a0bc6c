//! Failures of the CouchDB car store.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::UniqueField;

pub type CouchResult<T> = Result<T, CouchDaoError>;

#[derive(Debug, Error)]
pub enum CouchDaoError {
    #[error("invalid CouchDB base URL `{url}`")]
    InvalidBaseUrl { url: String },
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request for `target` (a database or document ID) never got a response.
    #[error("CouchDB request for `{target}` failed")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB answered {status} for `{target}`")]
    UnexpectedStatus { target: String, status: StatusCode },
    #[error("unreadable CouchDB response for `{target}`")]
    Decode {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    /// A stored document does not match the car or category layout.
    #[error("malformed CouchDB document in `{target}`")]
    MalformedDocument {
        target: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("document ID `{doc_id}` does not carry a record ID")]
    InvalidDocId { doc_id: String },
    /// The uniqueness marker for the value is held by another car.
    #[error("a car with the same {field} is already stored")]
    Duplicate { field: UniqueField },
    #[error("category `{name}` could not be stored")]
    CategoryClaim { name: String },
}
