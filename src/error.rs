use thiserror::Error;

/// Main error type for the dashboard core
#[derive(Error, Debug)]
pub enum BoardError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Durable storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for BoardError
pub type Result<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BoardError::Storage("key not writable".to_string());
        assert_eq!(err.to_string(), "Storage error: key not writable");

        let err = BoardError::Validation("tick_interval_ms must be positive".to_string());
        assert!(err.to_string().starts_with("Validation failed"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: BoardError = parse.unwrap_err().into();
        assert!(matches!(err, BoardError::Json(_)));
    }
}
