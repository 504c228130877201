//! Error types for the OrientDB client core

use std::fmt;
use thiserror::Error;

/// Error kinds, used for matching and log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Record id text does not match `#?<cluster>:<position>`
    MalformedRecordId,
    /// Null/empty required input
    InvalidArgument,
    /// Wire value cannot be converted to the declared field type
    HydrationTypeMismatch,
    /// Operation not allowed in the unit of work's current state
    InvalidTransactionState,
    /// Wire encoding/decoding errors
    Serialization,
    /// Failure reported by the connection boundary
    Connection,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedRecordId => "malformed_record_id",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::HydrationTypeMismatch => "hydration_type_mismatch",
            ErrorKind::InvalidTransactionState => "invalid_transaction_state",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Connection => "connection",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum OrientError {
    #[error("malformed record id '{input}': {reason}")]
    MalformedRecordId { input: String, reason: String },

    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("cannot hydrate '{key}': expected {expected}, got {actual}")]
    HydrationTypeMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("cannot {operation} a unit of work in state {state}")]
    InvalidTransactionState { state: String, operation: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl OrientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrientError::MalformedRecordId { .. } => ErrorKind::MalformedRecordId,
            OrientError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            OrientError::HydrationTypeMismatch { .. } => ErrorKind::HydrationTypeMismatch,
            OrientError::InvalidTransactionState { .. } => ErrorKind::InvalidTransactionState,
            OrientError::Serialization(_) => ErrorKind::Serialization,
            OrientError::Connection(_) => ErrorKind::Connection,
        }
    }

    // Convenience constructors
    pub fn malformed_record_id(input: impl Into<String>, reason: impl Into<String>) -> Self {
        OrientError::MalformedRecordId {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        OrientError::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn type_mismatch(
        key: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        OrientError::HydrationTypeMismatch {
            key: key.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_state(state: impl fmt::Display, operation: impl Into<String>) -> Self {
        OrientError::InvalidTransactionState {
            state: state.to_string(),
            operation: operation.into(),
        }
    }

    /// Wrap a failure coming from a connection/protocol implementation
    pub fn connection(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        OrientError::Connection(err.into())
    }
}

impl From<serde_json::Error> for OrientError {
    fn from(err: serde_json::Error) -> Self {
        OrientError::Serialization(format!("JSON error: {}", err))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, OrientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let err = OrientError::malformed_record_id("12", "missing ':'");
        assert_eq!(err.kind(), ErrorKind::MalformedRecordId);
        assert_eq!(err.kind().as_str(), "malformed_record_id");

        let err = OrientError::invalid_state("COMMITTED", "stage");
        assert_eq!(err.kind(), ErrorKind::InvalidTransactionState);
    }

    #[test]
    fn test_display_names_offending_key() {
        let err = OrientError::type_mismatch("age", "Int", "String");
        let text = err.to_string();
        assert!(text.contains("age"));
        assert!(text.contains("Int"));
        assert!(text.contains("String"));
    }

    #[test]
    fn test_connection_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = OrientError::connection(io);
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_json_error_conversion() {
        let bad: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: OrientError = bad.unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
