//! Defines the `ApiError` type for the HTTP server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::engine::correlation_service::StatsHandleError;

/// An error returned by a handler, converted into an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// A query parameter could not be accepted.
    BadRequest(String),

    /// The correlation service has stopped and cannot answer queries.
    ServiceUnavailable,
}

impl From<StatsHandleError> for ApiError {
    fn from(_: StatsHandleError) -> Self {
        ApiError::ServiceUnavailable
    }
}

/// Maps handler errors to user-facing HTTP responses.
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::ServiceUnavailable => {
                tracing::error!("Query received after the correlation service stopped.");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "Statistics are currently unavailable" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_maps_to_400() {
        let response = ApiError::BadRequest("Invalid `from` value".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_stopped_service_maps_to_503() {
        let response = ApiError::from(StatsHandleError).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
