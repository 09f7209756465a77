// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for the scan pipeline and its HTTP shell

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: One enum for every failure the service can observe
/// Per-point and per-region variants are contained by the scan coordinator;
/// only `Configuration` is fatal, and only at startup.
/// A region that the geocoder does not know is `Ok(None)`, not an error.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Region resolution failed: {0}")]
    ResolutionFailed(String),

    #[error("Directory fetch failed: {0}")]
    FetchFailed(String),

    #[error("Report delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden access")]
    Forbidden,

    #[error("A scan run is already in progress")]
    ScanInProgress,

    #[error("Internal server error")]
    InternalError,
}

impl ScanError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ScanError::ResolutionFailed(_) => (StatusCode::BAD_GATEWAY, "RESOLUTION_FAILED"),
            ScanError::FetchFailed(_) => (StatusCode::BAD_GATEWAY, "FETCH_FAILED"),
            ScanError::DeliveryFailed(_) => (StatusCode::BAD_GATEWAY, "DELIVERY_FAILED"),
            ScanError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
            ScanError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ScanError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ScanError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ScanError::ScanInProgress => (StatusCode::CONFLICT, "SCAN_IN_PROGRESS"),
            ScanError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// Convert ScanError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for ScanError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = self.parts();

        let body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.parts().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ScanError::ScanInProgress.status_code(), StatusCode::CONFLICT);
        assert_eq!(ScanError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ScanError::InvalidInput("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ScanError::FetchFailed("timeout".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ScanError::ResolutionFailed("connection refused".to_string());
        assert_eq!(err.to_string(), "Region resolution failed: connection refused");
    }
}
