//! docmod - reorganize documentation symbol trees by logical module.
//!
//! This crate provides the CLI binary for docmod.
//!
//! ## Modules
//!
//! - `cli` - CLI command implementations
//! - `config` - Configuration resolution with precedence tracking

pub mod cli;
pub mod config;

// Re-export core modules for convenience
pub use docmod_core::document;
pub use docmod_core::error;
pub use docmod_core::output;
pub use docmod_core::reorganize;
pub use docmod_core::tags;
pub use docmod_core::tree;

pub use docmod_core::error::{DocmodError, DocmodResult, OutputErrorCode};
pub use docmod_core::output::{ErrorInfo, ErrorResponse, SCHEMA_VERSION};
