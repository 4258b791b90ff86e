use thiserror::Error;

/// Error taxonomy for board mutations.
///
/// `Validation` and `NotFound` are client errors and never change state.
/// `Storage` is fatal for the in-flight request — the transaction is rolled
/// back, nothing is broadcast, and no retry is attempted.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("task not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A stored enum value no longer parses. Indicates external tampering or
    /// a skipped migration.
    #[error("corrupt {field} value in storage: {value}")]
    Corrupt { field: &'static str, value: String },
}

impl BoardError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        BoardError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn corrupt(field: &'static str, value: &str) -> Self {
        BoardError::Corrupt {
            field,
            value: value.to_string(),
        }
    }
}
