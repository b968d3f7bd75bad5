/// Error types for nextapp
///
/// The scoring engine itself never fails. Everything here comes from the
/// event store, the recorder, or the config layer around it.
/// Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Main error type for nextapp operations
#[derive(Error, Debug)]
pub enum PredictorError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O errors (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Event failed validation and was not recorded
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for nextapp operations
pub type Result<T> = std::result::Result<T, PredictorError>;

/// Convert PredictorError to a user-friendly error message
impl PredictorError {
    pub fn user_message(&self) -> String {
        match self {
            PredictorError::Database(e) => {
                format!("Event store error. Nothing was predicted. Details: {}", e)
            }
            PredictorError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            PredictorError::Serialization(e) => {
                format!("Data format error: {}", e)
            }
            PredictorError::InvalidEvent(reason) => {
                format!("Event was not recorded: {}", reason)
            }
            PredictorError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            PredictorError::Generic(msg) => msg.clone(),
        }
    }
}
