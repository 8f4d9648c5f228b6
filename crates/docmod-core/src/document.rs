//! Serialized form of the symbol tree.
//!
//! The analysis stage hands the tree over as a JSON document and the
//! rendering stage reads it back in the same shape:
//!
//! ```json
//! {
//!   "name": "demo",
//!   "children": [
//!     { "id": 1, "name": "src/core.ts", "kind": "module", "children": [
//!       { "id": 2, "name": "Engine", "kind": "class",
//!         "comment": { "short_text": "Runs things.", "tags": [{ "tag": "module", "text": "Core" }] } }
//!     ] },
//!     { "id": 3, "name": "Engine", "kind": "reference", "target": 2 }
//!   ]
//! }
//! ```
//!
//! Kind-groups are derived from children on load; any `groups` present in the
//! input are ignored. The project always has id 0, so document ids must be
//! non-zero.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{DocmodError, DocmodResult};
use crate::tree::{Comment, Node, NodeId, NodeRole, SymbolKind, SymbolTree, PROJECT_ID};

// ============================================================================
// Document Types
// ============================================================================

/// Root of a serialized tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// Project name.
    pub name: String,
    /// Top-level nodes.
    #[serde(default)]
    pub children: Vec<NodeDocument>,
    /// Top-level kind-groups (output only).
    #[serde(default, skip_serializing_if = "Vec::is_empty", skip_deserializing)]
    pub groups: Vec<GroupDocument>,
}

/// Structural role as written in documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    Container,
    Declaration,
    Reference,
}

impl RoleName {
    /// Role implied by a kind when the document does not name one.
    pub fn for_kind(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Module => RoleName::Container,
            SymbolKind::Reference => RoleName::Reference,
            _ => RoleName::Declaration,
        }
    }
}

/// One serialized node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Stable id (non-zero, unique within the document).
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Kind tag.
    pub kind: SymbolKind,
    /// Structural role; derived from `kind` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleName>,
    /// Comment payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Comment>,
    /// Referenced declaration (references only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeId>,
    /// Owned children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeDocument>>,
    /// Kind-groups (output only).
    #[serde(default, skip_serializing_if = "Option::is_none", skip_deserializing)]
    pub groups: Option<Vec<GroupDocument>>,
}

impl NodeDocument {
    /// Create a childless node document.
    pub fn new(id: u32, name: impl Into<String>, kind: SymbolKind) -> Self {
        NodeDocument {
            id: NodeId::new(id),
            name: name.into(),
            kind,
            role: None,
            comment: None,
            target: None,
            children: None,
            groups: None,
        }
    }

    /// Set the children.
    pub fn with_children(mut self, children: Vec<NodeDocument>) -> Self {
        self.children = Some(children);
        self
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }

    /// Set the reference target.
    pub fn with_target(mut self, target: u32) -> Self {
        self.target = Some(NodeId::new(target));
        self
    }

    /// Set an explicit role.
    pub fn with_role(mut self, role: RoleName) -> Self {
        self.role = Some(role);
        self
    }
}

/// One serialized kind-group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDocument {
    /// Display title.
    pub title: String,
    /// Kind shared by the members.
    pub kind: SymbolKind,
    /// Member ids in display order.
    pub children: Vec<NodeId>,
}

// ============================================================================
// Loading
// ============================================================================

impl SymbolTree {
    /// Build a tree from a document.
    ///
    /// Fails on a zero or duplicate id, a `project` kind below the root, a
    /// reference without a target, or a reference whose target is missing or
    /// is itself a reference.
    pub fn from_document(document: &ProjectDocument) -> DocmodResult<SymbolTree> {
        let mut tree = SymbolTree::new(document.name.clone());
        let mut seen = BTreeSet::new();
        let mut references = Vec::new();

        for child in &document.children {
            load_node(&mut tree, child, PROJECT_ID, &mut seen, &mut references)?;
        }

        for &(reference, target) in &references {
            let valid = tree.node(target).is_some_and(|n| !n.is_reference());
            if !valid {
                return Err(DocmodError::DanglingReference { reference, target });
            }
        }

        for id in tree.walk() {
            tree.rebuild_groups(id);
        }

        Ok(tree)
    }

    /// Serialize the tree reachable from the project.
    pub fn to_document(&self) -> ProjectDocument {
        let project = self.project();
        ProjectDocument {
            name: project.name.clone(),
            children: project
                .children()
                .iter()
                .filter_map(|&id| self.node_document(id))
                .collect(),
            groups: groups_document(project),
        }
    }

    fn node_document(&self, id: NodeId) -> Option<NodeDocument> {
        let node = self.node(id)?;
        let (role, target) = match node.role {
            NodeRole::Project => return None,
            NodeRole::Container => (RoleName::Container, None),
            NodeRole::Declaration => (RoleName::Declaration, None),
            NodeRole::Reference { target } => (RoleName::Reference, Some(target)),
        };
        Some(NodeDocument {
            id,
            name: node.name.clone(),
            kind: node.kind,
            role: Some(role),
            comment: node.comment.clone().filter(|c| !c.is_empty()),
            target,
            children: node.children.as_ref().map(|children| {
                children
                    .iter()
                    .filter_map(|&child| self.node_document(child))
                    .collect()
            }),
            groups: node.groups.as_ref().map(|_| groups_document(node)),
        })
    }
}

fn groups_document(node: &Node) -> Vec<GroupDocument> {
    node.groups()
        .iter()
        .map(|g| GroupDocument {
            title: g.title.clone(),
            kind: g.kind,
            children: g.children.clone(),
        })
        .collect()
}

fn load_node(
    tree: &mut SymbolTree,
    doc: &NodeDocument,
    parent: NodeId,
    seen: &mut BTreeSet<NodeId>,
    references: &mut Vec<(NodeId, NodeId)>,
) -> DocmodResult<()> {
    if doc.id == PROJECT_ID {
        return Err(DocmodError::invalid_document(format!(
            "node {:?} uses reserved id 0",
            doc.name
        )));
    }
    if !seen.insert(doc.id) {
        return Err(DocmodError::DuplicateNodeId { id: doc.id });
    }
    if doc.kind == SymbolKind::Project {
        return Err(DocmodError::invalid_document(format!(
            "{} uses kind \"project\" below the root",
            doc.id
        )));
    }

    let role = match doc.role.unwrap_or_else(|| RoleName::for_kind(doc.kind)) {
        RoleName::Container => NodeRole::Container,
        RoleName::Declaration => NodeRole::Declaration,
        RoleName::Reference => {
            let target = doc.target.ok_or_else(|| {
                DocmodError::invalid_document(format!("reference {} has no target", doc.id))
            })?;
            references.push((doc.id, target));
            NodeRole::Reference { target }
        }
    };

    let mut node = Node::new(doc.id, doc.name.clone(), doc.kind, role);
    node.comment = doc.comment.clone();
    node.parent = Some(parent);
    if doc.children.is_some() || role == NodeRole::Container {
        node.children = Some(Vec::new());
        node.groups = Some(Vec::new());
    }
    tree.insert_node(node);

    if let Some(parent_children) = tree.node_mut(parent).and_then(|n| n.children.as_mut()) {
        parent_children.push(doc.id);
    }

    for child in doc.children.iter().flatten() {
        load_node(tree, child, doc.id, seen, references)?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
