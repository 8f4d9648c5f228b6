//! JSON output types and serialization for CLI responses.
//!
//! Every response written by the `docmod` binary is one of the structs below.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as its first field
//! 2. **Deterministic:** Same input produces the same bytes (field order, array order)
//! 3. **Absent means not applicable:** Optional fields are omitted, not `null`
//! 4. **Versioned:** `schema_version` enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::document::ProjectDocument;
use crate::error::{DocmodError, OutputErrorCode};
use crate::reorganize::ReorganizeReport;
use crate::tags::ModuleTags;
use crate::tree::NodeId;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Warnings
// ============================================================================

/// A recoverable problem reported alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Node the warning is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    /// Suggested action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Warning {
    /// Create a warning without node or suggestion.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            node: None,
            suggestion: None,
        }
    }

    /// Attach the node the warning is about.
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// Attach a suggested action.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code (also the process exit code).
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a DocmodError.
    pub fn from_error(err: &DocmodError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let details = match err {
            DocmodError::DuplicateNodeId { id } => Some(serde_json::json!({ "id": id })),
            DocmodError::DanglingReference { reference, target } => Some(serde_json::json!({
                "reference": reference,
                "target": target,
            })),
            DocmodError::FileNotFound { path } => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            _ => None,
        };

        ErrorInfo {
            code,
            message: err.to_string(),
            details,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a DocmodError.
    pub fn from_error(err: &DocmodError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Response Structs
// ============================================================================

/// Response for the reorganize command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorganizeResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// What the pass did.
    pub report: ReorganizeReport,
    /// The reorganized tree.
    pub project: ProjectDocument,
}

impl ReorganizeResponse {
    /// Create a reorganize response.
    pub fn new(report: ReorganizeReport, project: ProjectDocument) -> Self {
        ReorganizeResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            report,
            project,
        }
    }
}

/// One `@moduledefinition` in a tags response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionInfo {
    /// Logical module name.
    pub name: String,
    /// Extracted comment (omitted when empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    /// Defining container.
    pub container: NodeId,
    /// Current display name of the container.
    pub container_name: String,
}

/// One `@module` assignment in a tags response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationInfo {
    /// Target logical module name.
    pub module: String,
    /// Tagged declaration.
    pub declaration: NodeId,
    /// Display name of the declaration.
    pub name: String,
}

/// Response for the tags command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Definitions in registration order.
    pub definitions: Vec<DefinitionInfo>,
    /// Declarations in ascending id order.
    pub declarations: Vec<DeclarationInfo>,
}

impl TagsResponse {
    /// Create a tags response from collected records and resolved names.
    pub fn new(definitions: Vec<DefinitionInfo>, declarations: Vec<DeclarationInfo>) -> Self {
        TagsResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            definitions,
            declarations,
        }
    }

    /// Build from collected records, looking names up with `name_of`.
    pub fn from_tags(tags: &ModuleTags, name_of: impl Fn(NodeId) -> String) -> Self {
        let definitions = tags
            .definitions
            .iter()
            .map(|d| DefinitionInfo {
                name: d.name.clone(),
                comment: d.comment.clone(),
                container: d.container,
                container_name: name_of(d.container),
            })
            .collect();
        let declarations = tags
            .declarations
            .values()
            .map(|d| DeclarationInfo {
                module: d.name.clone(),
                declaration: d.declaration,
                name: name_of(d.declaration),
            })
            .collect();
        TagsResponse::new(definitions, declarations)
    }
}

// ============================================================================
// Emitters
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for the CLI; the output is deterministic.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
