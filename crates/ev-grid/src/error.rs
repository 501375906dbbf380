use crate::config::ConfigError;
use crate::seed::SeedError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Caller-facing classification shared by every engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A parent entity referenced by the request does not exist.
    ReferenceError,
    NotFound,
    /// The workflow transition is not legal from the current state.
    InvalidState,
    InvalidArgument,
    /// The operation is blocked by ownership or uniqueness rules.
    ConflictError,
    MissingCoordinates,
    Unavailable,
}

impl FailureKind {
    pub const fn label(self) -> &'static str {
        match self {
            FailureKind::ReferenceError => "reference_error",
            FailureKind::NotFound => "not_found",
            FailureKind::InvalidState => "invalid_state",
            FailureKind::InvalidArgument => "invalid_argument",
            FailureKind::ConflictError => "conflict_error",
            FailureKind::MissingCoordinates => "missing_coordinates",
            FailureKind::Unavailable => "unavailable",
        }
    }

    pub const fn status_code(self) -> StatusCode {
        match self {
            FailureKind::ReferenceError | FailureKind::MissingCoordinates => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            FailureKind::NotFound => StatusCode::NOT_FOUND,
            FailureKind::InvalidState | FailureKind::ConflictError => StatusCode::CONFLICT,
            FailureKind::InvalidArgument => StatusCode::BAD_REQUEST,
            FailureKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Render an engine failure as the JSON error body shared by all routers.
pub fn failure_response(kind: FailureKind, message: String) -> Response {
    let payload = json!({
        "error": message,
        "kind": kind.label(),
    });
    (kind.status_code(), Json(payload)).into_response()
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Seed(SeedError),
    Io(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Seed(err) => write!(f, "seed error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Seed(err) => Some(err),
            AppError::Io(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Seed(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<SeedError> for AppError {
    fn from(value: SeedError) -> Self {
        Self::Seed(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
