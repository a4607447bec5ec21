//! Error types for ReadRoom.

use thiserror::Error;

/// Common error type for ReadRoom.
#[derive(Error, Debug)]
pub enum ReadRoomError {
    /// Database error.
    ///
    /// Wraps errors from any database backend; sqlx errors are converted
    /// automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for ReadRoomError {
    fn from(e: sqlx::Error) -> Self {
        ReadRoomError::Database(e.to_string())
    }
}

/// Result type alias for ReadRoom operations.
pub type Result<T> = std::result::Result<T, ReadRoomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = ReadRoomError::Auth("invalid token".to_string());
        assert_eq!(err.to_string(), "authentication error: invalid token");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ReadRoomError::Validation("message body is empty".to_string());
        assert_eq!(err.to_string(), "validation error: message body is empty");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = ReadRoomError::NotFound("book".to_string());
        assert_eq!(err.to_string(), "book not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReadRoomError = io_err.into();
        assert!(matches!(err, ReadRoomError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(ReadRoomError::Auth("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
