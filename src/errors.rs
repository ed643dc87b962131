use http::StatusCode;
use serde_json::json;
use thiserror::Error;
use worker::{Error as WorkerError, Response};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Failed to {operation}: {message}")]
    Upstream {
        operation: &'static str,
        message: String,
    },
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    /// HTTP classification of the error: caller mistakes are 4xx, store
    /// failures 502, everything else 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Renders the error as `{"error": "..."}` with the matching status.
    pub fn to_response(&self) -> worker::Result<Response> {
        let message = match self {
            // worker errors can carry JS internals; keep them out of responses
            AppError::Worker(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        Ok(Response::from_json(&json!({ "error": message }))?
            .with_status(self.status_code().as_u16()))
    }
}

impl From<AppError> for WorkerError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Worker(e) => e,
            other => WorkerError::RustError(other.to_string()),
        }
    }
}
