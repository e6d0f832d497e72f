//! # Error Types
//!
//! Structured error types for boq_core. The calculators themselves never fail
//! (bad numbers are normalized, missing geometry yields an empty takeoff), so
//! these errors come from the layer around them: parsing selectors, looking up
//! project items, and reading or writing `.boq` files.
//!
//! ## Example
//!
//! ```rust
//! use boq_core::calculations::wall::WallType;
//!
//! let err = WallType::from_str_flexible("timber").unwrap_err();
//! assert_eq!(err.error_code(), "INVALID_INPUT");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for boq_core operations
pub type EstimateResult<T> = Result<T, EstimateError>;

/// Structured error type for estimation and project operations.
///
/// Serializes with a `type`/`details` envelope so API consumers can branch
/// on the variant without parsing the message.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum EstimateError {
    /// An input value could not be understood (unknown wall type, bad policy string, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// BOQ item not found in the project
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Another estimator is saving changes to the same project
    #[error("Project busy: '{path}' is being edited by {held_by} since {since}")]
    ProjectBusy {
        path: String,
        held_by: String,
        since: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl EstimateError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an ItemNotFound error
    pub fn item_not_found(item_id: impl Into<String>) -> Self {
        EstimateError::ItemNotFound {
            item_id: item_id.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Adapter for `map_err` on I/O results touching `path`
    pub fn io(operation: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.display().to_string();
        move |e| EstimateError::file_error(operation, path, e.to_string())
    }

    /// Create a ProjectBusy error
    pub fn project_busy(path: impl Into<String>, held_by: impl Into<String>, since: impl Into<String>) -> Self {
        EstimateError::ProjectBusy {
            path: path.into(),
            held_by: held_by.into(),
            since: since.into(),
        }
    }

    /// Create a SerializationError from anything displayable (usually `serde_json::Error`)
    pub fn serialization(reason: impl std::fmt::Display) -> Self {
        EstimateError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Worth retrying once the other edit has been saved
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EstimateError::ProjectBusy { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            EstimateError::InvalidInput { .. } => "INVALID_INPUT",
            EstimateError::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            EstimateError::FileError { .. } => "FILE_ERROR",
            EstimateError::ProjectBusy { .. } => "PROJECT_BUSY",
            EstimateError::SerializationError { .. } => "SERIALIZATION_ERROR",
            EstimateError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = EstimateError::invalid_input("wallType", "brick", "Unknown wall type");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: EstimateError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(EstimateError::item_not_found("abc").error_code(), "ITEM_NOT_FOUND");
        assert_eq!(EstimateError::serialization("eof").error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_only_busy_projects_are_recoverable() {
        assert!(EstimateError::project_busy("a.boq", "someone", "now").is_recoverable());
        assert!(!EstimateError::file_error("open", "a.boq", "denied").is_recoverable());
    }

    #[test]
    fn test_io_adapter() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = EstimateError::io("read", Path::new("fitout.boq"))(missing);
        assert_eq!(err.error_code(), "FILE_ERROR");
        assert_eq!(err.to_string(), "File error: read on 'fitout.boq' - gone");
    }
}
