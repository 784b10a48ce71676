use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query execution error: {0}")]
    QueryExecution(String),

    #[error("Schema introspection error: {0}")]
    SchemaIntrospection(String),

    #[error("Translation configuration error: {0}")]
    TranslationConfig(String),

    #[error("LLM service error: {0}")]
    TranslationUpstream(String),

    #[error("Unsafe query rejected: {0}")]
    UnsafeQuery(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// The message without the variant prefix, as shown to console users.
    pub fn detail(&self) -> &str {
        match self {
            AppError::Connection(msg)
            | AppError::QueryExecution(msg)
            | AppError::SchemaIntrospection(msg)
            | AppError::TranslationConfig(msg)
            | AppError::TranslationUpstream(msg)
            | AppError::UnsafeQuery(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match self {
            AppError::Connection(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new("CONNECTION_ERROR", msg)
                    .with_details("Check DB_HOST, DB_USER and DB_PASSWORD."),
            ),
            AppError::QueryExecution(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("QUERY_EXECUTION_ERROR", msg),
            ),
            AppError::SchemaIntrospection(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("SCHEMA_ERROR", msg),
            ),
            AppError::TranslationConfig(msg) => {
                let detail = ErrorDetail::new("TRANSLATION_CONFIG_ERROR", msg.clone());
                let detail = if msg.contains("GROQ_API_KEY") {
                    detail.with_details("Set GROQ_API_KEY in the environment or .env file.")
                } else {
                    detail
                };
                (StatusCode::UNPROCESSABLE_ENTITY, detail)
            }
            AppError::TranslationUpstream(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new("LLM_SERVICE_ERROR", msg),
            ),
            AppError::UnsafeQuery(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("UNSAFE_QUERY", msg),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_detail,
        });

        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Driver errors surface as query failures unless the caller maps them to something narrower
impl From<mysql_async::Error> for AppError {
    fn from(err: mysql_async::Error) -> Self {
        AppError::QueryExecution(err.to_string())
    }
}
