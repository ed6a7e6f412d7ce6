use thiserror::Error;

/// Result type for gridchase operations
pub type Result<T> = std::result::Result<T, GridChaseError>;

/// Main error type for the gridchase library.
///
/// Non-finite inputs and re-initialized parameters are not errors. The
/// network recovers from them in place and counts them in its `NumericReport`.
#[derive(Debug, Error)]
pub enum GridChaseError {
    /// Invalid dimensions for operations
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A persisted model document that does not match the expected schema
    #[error("Malformed model document: {0}")]
    MalformedModel(String),
}

impl From<serde_json::Error> for GridChaseError {
    fn from(err: serde_json::Error) -> Self {
        GridChaseError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for GridChaseError {
    fn from(err: bincode::Error) -> Self {
        GridChaseError::Serialization(err.to_string())
    }
}

// Helper functions for common error patterns
impl GridChaseError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        GridChaseError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        GridChaseError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_model<S: Into<String>>(reason: S) -> Self {
        GridChaseError::MalformedModel(reason.into())
    }
}
