use serde::Serialize;
use utoipa::ToSchema;

/// Whether the service can currently reach its car store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// No usable storage; car endpoints answer 503.
    Degraded,
}

/// Payload of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
}

impl HealthResponse {
    pub fn from_degraded(degraded: bool) -> Self {
        let status = if degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        Self { status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let body = serde_json::to_value(HealthResponse::from_degraded(true)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "degraded" }));

        let body = serde_json::to_value(HealthResponse::from_degraded(false)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "ok" }));
    }
}
