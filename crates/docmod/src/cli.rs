//! CLI command implementations.
//!
//! Provides the helpers behind the `docmod` subcommands:
//! - `reorganize` - load a tree, collect module tags, run the engine
//! - `tags` - load a tree and list the module tags it carries
//!
//! ## Error Handling
//!
//! All functions return `DocmodResult<T>`. The caller (`main.rs`) turns an
//! error into an `ErrorResponse` and the matching exit code.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use docmod_core::document::ProjectDocument;
use docmod_core::error::{DocmodError, DocmodResult};
use docmod_core::output::{emit_response, ReorganizeResponse, TagsResponse};
use docmod_core::reorganize::reorganize;
use docmod_core::tree::SymbolTree;

use crate::config::ResolvedConfig;

/// Read and validate a tree document.
pub fn load_tree(path: &Path) -> DocmodResult<SymbolTree> {
    if !path.exists() {
        return Err(DocmodError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    let document: ProjectDocument = serde_json::from_str(&text)?;
    let tree = SymbolTree::from_document(&document)?;
    debug!("loaded {} nodes from {}", tree.len(), path.display());
    Ok(tree)
}

/// Reorganize the tree stored at `input`.
pub fn run_reorganize(input: &Path, config: &ResolvedConfig) -> DocmodResult<ReorganizeResponse> {
    let mut tree = load_tree(input)?;
    let tags = config.tag_collector().collect(&mut tree);
    info!(
        definitions = tags.definitions.len(),
        declarations = tags.declarations.len(),
        "collected module tags"
    );

    let report = reorganize(&mut tree, &tags, config.reorganize_options());
    Ok(ReorganizeResponse::new(report, tree.to_document()))
}

/// List the module tags in the tree stored at `input`.
pub fn run_tags(input: &Path, config: &ResolvedConfig) -> DocmodResult<TagsResponse> {
    let mut tree = load_tree(input)?;
    let tags = config.tag_collector().collect(&mut tree);
    Ok(TagsResponse::from_tags(&tags, |id| {
        tree.name(id).unwrap_or_default().to_string()
    }))
}

/// Write a response to `output`, or to stdout when no file is given.
pub fn write_response<T: Serialize>(response: &T, output: Option<&Path>) -> DocmodResult<()> {
    match output {
        Some(path) => {
            let mut file = fs::File::create(path)?;
            emit_response(response, &mut file)?;
            file.flush()?;
            debug!("wrote response to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            emit_response(response, &mut stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
