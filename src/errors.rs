use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required selection is missing or a field is malformed.
    #[error("Validation error on `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Calculator inputs that can never produce a meaningful accrual.
    #[error("Invalid accrual input: {message}")]
    InvalidInput { message: String },

    #[error("Balance lookup failed: {message}")]
    LookupFailure { message: String },

    #[error("Submission failed: {message}")]
    SubmissionFailure { message: String },

    #[error("Could not print coupon {number}: {message}")]
    PrintFailure { number: u64, message: String },

    #[error("No invoice at index {index} for campaign {campania_id}, promotion {promocion_id}")]
    EntryNotFound {
        campania_id: i64,
        promocion_id: i64,
        index: usize,
    },

    #[error("Another batch operation is still in progress")]
    Busy,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
