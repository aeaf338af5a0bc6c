use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};
use validator::ValidationErrors;

use crate::dao::storage::{StorageError, UniqueField};

/// Human-readable messages surfaced verbatim to API clients.
pub mod messages {
    pub const CAR_NOT_FOUND: &str = "Car with given id not found";
    pub const REGISTRATION_NUMBER_NOT_FOUND: &str = "Car with given registration number not found";
    pub const VIN_NOT_FOUND: &str = "Car with given vin not found";
    pub const CAR_CREATE_VIN_EXISTS: &str = "Car with given vin already exists";
    pub const CAR_CREATE_REGISTRATION_NUMBER_EXISTS: &str =
        "Car with given registration number already exists";
    pub const CAR_TYPE_NOT_FOUND: &str = "Car type with given name not found";
    pub const SEARCH_CRITERIA_MISSING: &str =
        "Either license-plate or vin query parameter is required";
    pub const SERVICE_UNAVAILABLE: &str = "Car storage is currently unavailable";
    pub const INTERNAL_ERROR: &str = "Internal server error";
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// The request broke one or more field rules.
    #[error("invalid request: {}", .0.join(", "))]
    RequestInvalid(Vec<String>),
    /// Requested resource was not found.
    #[error("{0}")]
    NotFound(String),
    /// Another car already holds a unique value.
    #[error("{0}")]
    Conflict(String),
    /// Server-side misconfiguration or broken invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(message: &str) -> Self {
        ServiceError::NotFound(message.to_owned())
    }

    /// Conflict raised when a car with the same `field` value already exists.
    pub fn duplicate(field: UniqueField) -> Self {
        let message = match field {
            UniqueField::Vin => messages::CAR_CREATE_VIN_EXISTS,
            UniqueField::RegistrationNumber => messages::CAR_CREATE_REGISTRATION_NUMBER_EXISTS,
        };
        ServiceError::Conflict(message.to_owned())
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { field } => ServiceError::duplicate(field),
            unavailable => ServiceError::Unavailable(unavailable),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by(|(left, _), (right, _)| left.cmp(right));

        let messages = fields
            .into_iter()
            .flat_map(|(_, errors)| errors.iter())
            .map(|error| {
                error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string())
            })
            .collect();
        AppError::BadRequest(messages)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(status = %rejection.status(), "rejected request body");
        AppError::BadRequest(vec![rejection.body_text()])
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        debug!(status = %rejection.status(), "rejected query string");
        AppError::BadRequest(vec![rejection.body_text()])
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request carrying every rule the client broke.
    #[error("bad request: {}", .0.join(", "))]
    BadRequest(Vec<String>),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Conflict with already stored data.
    #[error("{0}")]
    Conflict(String),
    /// Storage unreachable or degraded. Details stay in the logs.
    #[error("{}", messages::SERVICE_UNAVAILABLE)]
    ServiceUnavailable,
    /// Details stay in the logs.
    #[error("{}", messages::INTERNAL_ERROR)]
    Internal,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => {
                error!(error = %source, "storage request failed");
                AppError::ServiceUnavailable
            }
            ServiceError::Degraded => AppError::ServiceUnavailable,
            ServiceError::RequestInvalid(messages) => AppError::BadRequest(messages),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::Internal(message) => {
                error!(%message, "internal error");
                AppError::Internal
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            AppError::BadRequest(messages) => messages,
            other => vec![other.to_string()],
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use validator::ValidationError;

    use super::*;

    #[test]
    fn storage_conflicts_become_duplicate_messages() {
        let err: ServiceError = StorageError::conflict(UniqueField::RegistrationNumber).into();
        assert!(matches!(
            err,
            ServiceError::Conflict(ref message)
                if message == messages::CAR_CREATE_REGISTRATION_NUMBER_EXISTS
        ));
    }

    #[test]
    fn validation_errors_keep_their_messages() {
        let mut errors = ValidationErrors::new();
        let mut size = ValidationError::new("range");
        size.message = Some("Size has to be greater or equal to 1".into());
        errors.add("size", size);
        errors.add("page", ValidationError::new("range"));

        let AppError::BadRequest(messages) = AppError::from(errors) else {
            panic!("expected a bad request");
        };
        assert_eq!(
            messages,
            vec![
                "range".to_string(),
                "Size has to be greater or equal to 1".to_string()
            ]
        );
    }

    #[test]
    fn server_side_details_stay_out_of_the_body() {
        let err = AppError::from(ServiceError::Internal(
            "default category `Other` is missing from storage".into(),
        ));
        assert_eq!(err.to_string(), messages::INTERNAL_ERROR);
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let unavailable = StorageError::unavailable(
            "couch request to http://admin@couch:5984/crm_cars failed".into(),
            std::io::Error::other("connection refused"),
        );
        let err = AppError::from(ServiceError::from(unavailable));
        assert_eq!(err.to_string(), messages::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn not_found_body_is_the_bare_message() {
        let err = AppError::from(ServiceError::not_found(messages::VIN_NOT_FOUND));
        assert_eq!(err.to_string(), messages::VIN_NOT_FOUND);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
