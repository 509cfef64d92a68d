use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error; // Use thiserror for cleaner error definitions
use uuid::Uuid;

use crate::validation::ValidationErrors;
use crate::views;

// --- Domain/Infrastructure Errors ---

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Meme not found with ID: {0}")]
    NotFound(Uuid),

    #[error("Stored record could not be decoded: {0}")]
    DataCorruption(String),

    #[error("Database backend error: {0}")]
    BackendError(#[from] anyhow::Error), // Wrap Anyhow errors from DB layer
}

// --- Service Errors ---

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("validation failed")]
    Validation(ValidationErrors),

    #[error("Meme not found with ID: {0}")]
    NotFound(Uuid),

    #[error("Actor is not allowed to modify meme {0}")]
    Forbidden(Uuid),

    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(id) => ServiceError::NotFound(id),
            e => ServiceError::Repo(e),
        }
    }
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    // Input validation / request parsing errors
    /// Create and update re-render their own form with a 422 before converting, so
    /// only a handler that doesn't re-render ends up here.
    #[error("Validation failed: {0:?}")]
    Validation(ValidationErrors),
    #[error("Invalid meme ID format: {0}")]
    InvalidUuid(#[from] uuid::Error),
    #[error("Unsupported form method: {0}")]
    UnsupportedMethod(String),

    // Domain/Service level errors
    #[error("Meme not found with ID: {0}")]
    MemeNotFound(Uuid),
    #[error("Not allowed to modify meme {0}")]
    Forbidden(Uuid),
    #[error("Could not access meme data")]
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
            RepoError::NotFound(id) => AppError::MemeNotFound(id),
            e => AppError::RepositoryError(e),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => AppError::Validation(errors),
            ServiceError::NotFound(id) => AppError::MemeNotFound(id),
            ServiceError::Forbidden(id) => AppError::Forbidden(id),
            ServiceError::Repo(e) => AppError::from(e),
        }
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InitError(err.to_string())
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // 4xx Client Errors
            AppError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Los datos enviados no son válidos.".to_string(),
            ),
            // Route-bound ids that don't parse can't name a meme; same answer as a missing one.
            AppError::InvalidUuid(_) | AppError::MemeNotFound(_) => (
                StatusCode::NOT_FOUND,
                "No encontramos ese meme.".to_string(),
            ),
            AppError::UnsupportedMethod(_) => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Método no permitido.".to_string(),
            ),
            AppError::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                "No tienes permiso para modificar este meme.".to_string(),
            ),

            // 5xx Server Errors
            AppError::RepositoryError(e) => {
                tracing::error!(error.source = ?e, "Repository error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database operation failed".to_string())
            }
            AppError::ConfigError(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error".to_string())
            }
            AppError::InitError(msg) => {
                tracing::error!("Initialization error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server initialization error".to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(error.message = %error_message, error.detail = %self, "Responding with error");
        } else {
            tracing::warn!(error.status = %status, error.detail = %self, "Responding with error");
        }

        (status, Html(views::error_page(status, &error_message))).into_response()
    }
}
