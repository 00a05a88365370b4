use shared::SharedError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 404 {
            Self::NotFound(message)
        } else {
            Self::Status { status, message }
        }
    }

    /// Connection-level failures and 5xx responses; worth retrying later
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<SharedError> for ApiError {
    fn from(err: SharedError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("Invalid URL: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_constructor_maps_not_found() {
        assert_eq!(
            ApiError::status(404, "Game not found"),
            ApiError::NotFound("Game not found".to_string())
        );
        assert_eq!(
            ApiError::status(500, "boom").to_string(),
            "Server returned 500: boom"
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(ApiError::Transport("connection refused".to_string()).is_transient());
        assert!(ApiError::status(503, "unavailable").is_transient());
        assert!(!ApiError::status(400, "bad").is_transient());
        assert!(!ApiError::Decode("eof".to_string()).is_transient());
    }

    #[test]
    fn test_shared_error_becomes_validation() {
        let err: ApiError = SharedError::MissingField("tenant_id".to_string()).into();
        assert_eq!(err, ApiError::Validation("Required field missing: tenant_id".to_string()));
    }
}
