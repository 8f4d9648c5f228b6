//! Error types and error code constants for docmod.
//!
//! This module provides a unified error type (`DocmodError`) for every fallible
//! surface around the reorganization engine: document loading, configuration
//! and CLI I/O. The engine itself never fails; an unresolved module name is
//! recovered locally and surfaced as a warning instead.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad flags, malformed configuration)
//! - `3`: Invalid document (malformed JSON, duplicate ids, dangling references)
//! - `10`: Internal errors (I/O failures)

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::tree::NodeId;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad flags, malformed configuration).
    InvalidArguments = 2,
    /// The input document could not be turned into a symbol tree.
    InvalidDocument = 3,
    /// Internal errors (I/O failures).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for docmod.
#[derive(Debug, Error)]
pub enum DocmodError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// The document is structurally invalid.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    /// Two nodes in the document share an id.
    #[error("duplicate node id {id}")]
    DuplicateNodeId { id: NodeId },

    /// A reference node points at a node that does not exist or is itself a reference.
    #[error("reference {reference} points at unknown declaration {target}")]
    DanglingReference { reference: NodeId, target: NodeId },

    /// Input file not found.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocmodError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        DocmodError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        DocmodError::InvalidDocument {
            message: message.into(),
        }
    }
}

/// Result type for docmod operations.
pub type DocmodResult<T> = Result<T, DocmodError>;

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&DocmodError> for OutputErrorCode {
    fn from(err: &DocmodError) -> Self {
        match err {
            DocmodError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            DocmodError::InvalidDocument { .. }
            | DocmodError::DuplicateNodeId { .. }
            | DocmodError::DanglingReference { .. }
            | DocmodError::FileNotFound { .. }
            | DocmodError::Json(_) => OutputErrorCode::InvalidDocument,
            DocmodError::Io(_) => OutputErrorCode::InternalError,
        }
    }
}

impl From<DocmodError> for OutputErrorCode {
    fn from(err: DocmodError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Tests
// ============================================================================
