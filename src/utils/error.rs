use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::checkin::StationError;
use crate::utils::response::error as error_response;

/// Failures at the session store boundary.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("Missing access token")]
    MissingAccessToken,

    #[error("Missing event id")]
    MissingEventId,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Access link rejected (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Local storage error")]
    Storage(#[from] sqlx::Error),

    #[error("Failed to encode cached event data")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Network,
    Auth,
    NotFound,
    Storage,
}

impl CheckInError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckInError::MissingAccessToken | CheckInError::MissingEventId => {
                ErrorKind::Configuration
            }
            CheckInError::Network(_) => ErrorKind::Network,
            CheckInError::Unauthorized { .. } => ErrorKind::Auth,
            CheckInError::EventNotFound(_) => ErrorKind::NotFound,
            CheckInError::Storage(_) | CheckInError::Encode(_) => ErrorKind::Storage,
        }
    }

    /// An authoritative rejection: cached allow-lists must not be served after it.
    pub fn is_rejection(&self) -> bool {
        matches!(self.kind(), ErrorKind::Auth | ErrorKind::NotFound)
    }

    /// Whether a manual retry can succeed without a new link.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Storage)
    }

    pub fn user_message(&self) -> String {
        match self {
            CheckInError::MissingAccessToken => {
                "Error: This check-in link has no access token. Please open a valid check-in link."
                    .to_string()
            }
            CheckInError::MissingEventId => {
                "Error: No event selected. Please open a valid check-in link.".to_string()
            }
            CheckInError::Network(_) | CheckInError::Storage(_) | CheckInError::Encode(_) => {
                "Error: Could not load event data. Please connect to the internet and retry."
                    .to_string()
            }
            CheckInError::Unauthorized { .. } => {
                "Error: Your access link is invalid or has expired. Please request a new check-in link."
                    .to_string()
            }
            CheckInError::EventNotFound(event_id) => {
                format!("Error: Event ID {} does not exist.", event_id)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Scanner not ready: {0}")]
    NotReady(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotReady(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::NotReady(_) => "SCANNER_NOT_READY",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
        }
    }

    /// Hint for the gate UI on whether a retry button makes sense.
    pub fn details(&self) -> Option<Value> {
        match self {
            AppError::ExternalServiceError(_) | AppError::DatabaseError(_) => {
                Some(json!({ "retryable": true }))
            }
            AppError::AuthError(_) => Some(json!({ "retryable": false })),
            _ => None,
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) | AppError::NotReady(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::AuthError(msg)
            | AppError::ExternalServiceError(msg)
            | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl From<CheckInError> for AppError {
    fn from(err: CheckInError) -> Self {
        let message = err.user_message();
        match err {
            CheckInError::MissingAccessToken | CheckInError::MissingEventId => {
                AppError::ValidationError(message)
            }
            CheckInError::Unauthorized { .. } => AppError::AuthError(message),
            CheckInError::EventNotFound(_) => AppError::NotFound(message),
            CheckInError::Network(_) => AppError::ExternalServiceError(message),
            CheckInError::Storage(e) => AppError::DatabaseError(e),
            CheckInError::Encode(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<StationError> for AppError {
    fn from(err: StationError) -> Self {
        match err {
            StationError::NotReady(message) => AppError::NotReady(message),
            StationError::CameraBlocked => AppError::NotReady("Camera access was denied".to_string()),
            StationError::Closed => AppError::NotFound("Check-in view is closed".to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        let public_message = match &self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg)
            | AppError::NotReady(msg)
            | AppError::ExternalServiceError(msg) => msg.clone(),
            AppError::DatabaseError(_) => "A local storage error occurred".to_string(),
            AppError::InternalServerError(_) => "An internal error occurred".to_string(),
        };

        error_response(code, public_message, self.details(), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy() {
        assert_eq!(CheckInError::MissingAccessToken.kind(), ErrorKind::Configuration);
        assert!(!CheckInError::MissingEventId.is_retryable());

        let network = CheckInError::Network("timed out".to_string());
        assert!(network.is_retryable());
        assert!(!network.is_rejection());

        let auth = CheckInError::Unauthorized { status: 401 };
        assert!(auth.is_rejection());
        assert!(!auth.is_retryable());
        assert!(auth.user_message().contains("new check-in link"));

        assert!(CheckInError::EventNotFound("E9".to_string()).is_rejection());
    }

    #[test]
    fn test_encode_failure_is_internal_not_database() {
        let json_err = serde_json::from_str::<u8>("not json").unwrap_err();
        let err = CheckInError::from(json_err);
        assert_eq!(err.kind(), ErrorKind::Storage);

        let app = AppError::from(err);
        assert!(matches!(app, AppError::InternalServerError(_)));
        assert_eq!(app.code(), "INTERNAL_SERVER_ERROR");
        assert_eq!(app.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_check_in_errors_map_to_http_status() {
        let cases = [
            (CheckInError::MissingAccessToken, StatusCode::BAD_REQUEST),
            (CheckInError::Unauthorized { status: 403 }, StatusCode::UNAUTHORIZED),
            (CheckInError::EventNotFound("E9".to_string()), StatusCode::NOT_FOUND),
            (CheckInError::Network("down".to_string()), StatusCode::BAD_GATEWAY),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_error_details_flag_retryable_failures() {
        let network = AppError::from(CheckInError::Network("down".to_string()));
        assert_eq!(network.details(), Some(json!({ "retryable": true })));

        let auth = AppError::from(CheckInError::Unauthorized { status: 401 });
        assert_eq!(auth.details(), Some(json!({ "retryable": false })));

        assert_eq!(AppError::NotFound("E9".to_string()).details(), None);
    }
}
