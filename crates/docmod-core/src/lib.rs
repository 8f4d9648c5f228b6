//! Core infrastructure for docmod.
//!
//! This crate provides the logical-module reorganization of a documentation
//! symbol tree:
//! - Symbol tree arena and its mutation primitives
//! - Module tag collection from node comments
//! - The reorganization engine (convert, prune, sort)
//! - Serialized document form of the tree
//! - Error types and error codes
//! - JSON output types for CLI responses

pub mod document;
pub mod error;
pub mod output;
pub mod reorganize;
pub mod tags;
pub mod tree;
