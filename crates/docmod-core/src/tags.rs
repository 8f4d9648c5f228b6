//! Module tags: `@moduledefinition` and `@module` records.
//!
//! The analysis stage attaches comments to nodes; [`TagCollector`] reads the
//! two recognized block tags out of those comments and produces the records
//! the reorganization engine consumes:
//!
//! - `@moduledefinition <name>` marks the enclosing module container as
//!   eligible to become the logical module `<name>` ([`ModuleDefinition`]).
//! - `@module <name>` asks for the tagged declaration to be moved into the
//!   logical module `<name>` ([`ModuleDeclaration`]).
//!
//! Tag payloads are taken as-is apart from trimming and stripping one pair of
//! surrounding quotes; no source text is parsed here.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::tree::{NodeId, NodeRole, SymbolTree};

/// Tag that declares a logical module.
pub const MODULE_DEFINITION_TAG: &str = "moduledefinition";

/// Tag that assigns a declaration to a logical module.
pub const MODULE_TAG: &str = "module";

// ============================================================================
// Records
// ============================================================================

/// A container that may become the top-level logical module `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDefinition {
    /// Logical module name.
    pub name: String,
    /// Comment text to attach to the module when it is promoted.
    pub comment: String,
    /// Container currently representing the module.
    pub container: NodeId,
}

/// A declaration that must end up inside the logical module `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDeclaration {
    /// Target logical module name.
    pub name: String,
    /// Declaration to relocate.
    pub declaration: NodeId,
}

/// Records gathered before reorganization.
///
/// Definitions keep registration order and are looked up first-match by name.
/// Declarations are keyed by declaration id; adding a second record for the
/// same declaration replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleTags {
    /// Module definitions in registration order.
    pub definitions: Vec<ModuleDefinition>,
    /// Module declarations keyed by declaration id.
    pub declarations: BTreeMap<NodeId, ModuleDeclaration>,
}

impl ModuleTags {
    /// Create an empty record set.
    pub fn new() -> Self {
        ModuleTags::default()
    }

    /// Register a module definition.
    pub fn add_definition(
        &mut self,
        name: impl Into<String>,
        comment: impl Into<String>,
        container: NodeId,
    ) {
        self.definitions.push(ModuleDefinition {
            name: name.into(),
            comment: comment.into(),
            container,
        });
    }

    /// Register a module declaration.
    pub fn add_declaration(&mut self, name: impl Into<String>, declaration: NodeId) {
        self.declarations.insert(
            declaration,
            ModuleDeclaration {
                name: name.into(),
                declaration,
            },
        );
    }

    /// First definition registered under `name`.
    pub fn find_definition(&self, name: &str) -> Option<&ModuleDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// True if `id` carries a `@module` assignment.
    pub fn is_tagged(&self, id: NodeId) -> bool {
        self.declarations.contains_key(&id)
    }

    /// True if no records were collected.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.declarations.is_empty()
    }
}

// ============================================================================
// Collector
// ============================================================================

/// Scans node comments for module tags.
#[derive(Debug, Clone)]
pub struct TagCollector {
    strip_tags: bool,
}

impl Default for TagCollector {
    fn default() -> Self {
        TagCollector { strip_tags: true }
    }
}

impl TagCollector {
    /// Create a collector that strips consumed tags from comments.
    pub fn new() -> Self {
        TagCollector::default()
    }

    /// Keep (`false`) or strip (`true`) consumed tags.
    pub fn with_strip_tags(mut self, strip_tags: bool) -> Self {
        self.strip_tags = strip_tags;
        self
    }

    /// Collect module records from every comment reachable from the project.
    pub fn collect(&self, tree: &mut SymbolTree) -> ModuleTags {
        let mut tags = ModuleTags::new();

        for id in tree.walk() {
            let Some(node) = tree.node(id) else {
                continue;
            };
            let Some(comment) = node.comment.as_ref() else {
                continue;
            };

            let mut consumed = false;
            for tag in &comment.tags {
                let tag_name = tag.tag.trim_start_matches('@').to_ascii_lowercase();
                if tag_name != MODULE_DEFINITION_TAG && tag_name != MODULE_TAG {
                    continue;
                }
                consumed = true;

                let Some(name) = module_name(&tag.text) else {
                    debug!("ignoring @{tag_name} with empty name on {id}");
                    continue;
                };

                if tag_name == MODULE_DEFINITION_TAG {
                    match tree.enclosing_container(id) {
                        Some(container) => {
                            debug!("{container} defines logical module {name:?}");
                            tags.add_definition(name, comment.short_text.trim(), container);
                        }
                        None => debug!("@moduledefinition {name:?} on {id} has no container"),
                    }
                } else if node.role == NodeRole::Declaration {
                    tags.add_declaration(name, id);
                } else {
                    debug!("ignoring @module {name:?} on non-declaration {id}");
                }
            }

            if consumed && self.strip_tags {
                if let Some(comment) = tree.node_mut(id).and_then(|n| n.comment.as_mut()) {
                    comment.tags.retain(|t| {
                        let tag_name = t.tag.trim_start_matches('@').to_ascii_lowercase();
                        tag_name != MODULE_DEFINITION_TAG && tag_name != MODULE_TAG
                    });
                }
            }
        }

        tags
    }
}

/// Normalize a tag payload into a module name.
fn module_name(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|&q| {
            trimmed
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
        })
        .unwrap_or(trimmed)
        .trim();
    (!unquoted.is_empty()).then(|| unquoted.to_string())
}

// ============================================================================
// Tests
// ============================================================================
