use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Failures raised while talking to a search backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Tantivy error: {0}")]
    TantivyError(#[from] tantivy::TantivyError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task error: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl BackendError {
    /// True when the backend never produced an answer for the call.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BackendError::Transport(_) | BackendError::IoError(_) | BackendError::TaskError(_)
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("No search backend connection has been established")]
    NotConnected,
}

impl ConnectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectionError::NotConnected => ErrorKind::NotConnected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotConnected,
    InvalidQuery,
    MalformedRequest,
    BackendUnavailable,
    IngestionFailed,
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Ingestion failed: {0}")]
    IngestionFailed(String),
}

impl From<ConnectionError> for GatewayError {
    fn from(error: ConnectionError) -> Self {
        GatewayError::BackendUnavailable(error.to_string())
    }
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::InvalidQuery(_) => ErrorKind::InvalidQuery,
            GatewayError::MalformedRequest(_) => ErrorKind::MalformedRequest,
            GatewayError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            GatewayError::IngestionFailed(_) => ErrorKind::IngestionFailed,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidQuery | ErrorKind::MalformedRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotConnected
            | ErrorKind::BackendUnavailable
            | ErrorKind::IngestionFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to HTTP callers. Backend internals never leave the process.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::InvalidQuery(msg) | GatewayError::MalformedRequest(msg) => msg.clone(),
            GatewayError::IngestionFailed(_) => "Failed to create documents".to_string(),
            GatewayError::BackendUnavailable(_) => "Something went wrong".to_string(),
        }
    }
}

/// Failures of the key-value demo stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    (
        code,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.public_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_errors() {
        let err = GatewayError::InvalidQuery("Query not specified".to_string());
        assert_eq!(err.kind(), ErrorKind::InvalidQuery);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Query not specified");

        let err = GatewayError::MalformedRequest("Malformed request body".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_backend_errors_hide_details() {
        let err = GatewayError::BackendUnavailable("connection refused on 10.0.0.4".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("10.0.0.4"));

        let err = GatewayError::IngestionFailed("mapper_parsing_exception".to_string());
        assert_eq!(err.kind(), ErrorKind::IngestionFailed);
        assert_eq!(err.public_message(), "Failed to create documents");
    }

    #[test]
    fn test_not_connected_surfaces_as_backend_unavailable() {
        assert_eq!(ConnectionError::NotConnected.kind(), ErrorKind::NotConnected);

        let err: GatewayError = ConnectionError::NotConnected.into();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_backend_error_transport_classification() {
        let io = BackendError::IoError(std::io::Error::new(std::io::ErrorKind::Other, "reset"));
        assert!(io.is_transport());

        let status = BackendError::Status {
            status: 400,
            body: "bad".to_string(),
        };
        assert!(!status.is_transport());
        assert_eq!(format!("{}", status), "Backend responded with status 400: bad");
    }
}
