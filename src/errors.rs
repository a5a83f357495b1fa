use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

// --- Domain/Infrastructure Errors ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Path `{0}` is required.")]
    MissingField(&'static str),
    #[error("Moment is too large: {size} bytes exceeds the {limit} byte limit.")]
    TooLarge { size: usize, limit: usize },
}

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database backend error: {0:#}")]
    BackendError(#[from] anyhow::Error), // Wrap Anyhow errors from DB layer

    #[error("Stored moment could not be decoded: {0}")]
    DataCorruption(String),
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    // Input validation / request parsing errors
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid moment ID format: {0}")]
    InvalidUuid(#[from] uuid::Error),

    // Store failures, message is passed through to the client
    #[error("{0}")]
    RepositoryError(#[source] RepoError),

    // Configuration / Startup errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Initialization error: {0}")]
    InitError(String),
}

// --- Conversions from Domain Errors to AppError ---

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Validation(e) => AppError::Validation(e),
            e => AppError::RepositoryError(e),
        }
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidInput(_) | AppError::InvalidUuid(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::RepositoryError(_) | AppError::ConfigError(_) | AppError::InitError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error.source = ?self, error.status = %status, "Responding with error");
        } else {
            tracing::warn!(error.message = %message, error.status = %status, "Rejecting request");
        }

        let body = Json(serde_json::json!({ "message": message }));
        (status, body).into_response()
    }
}
