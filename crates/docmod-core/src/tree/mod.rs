//! Symbol tree model: the arena that the reorganization engine mutates.
//!
//! This module provides the documentation symbol tree:
//! - [`Node`]: One arena entry (project, container, declaration or reference)
//! - [`NodeRole`]: Tagged variant; only [`NodeRole::Reference`] carries a
//!   non-owning pointer to another node
//! - [`KindGroup`]: Secondary per-container index of children by [`SymbolKind`]
//! - [`Comment`]: Comment payload attached by the analysis stage
//!
//! The [`SymbolTree`] owns every node in a single `BTreeMap` keyed by
//! [`NodeId`], so iteration is deterministic and nodes never alias each other.
//! Ownership edges live only in `parent`/`children`; kind-groups and reference
//! targets are plain ids.
//!
//! # Invariants
//!
//! - Every node reachable from the project is listed in exactly one parent's
//!   `children` and its `parent` points back at that node.
//! - A node listed in a container's `children` appears in exactly one of that
//!   container's kind-groups (when the container keeps a group index), and a
//!   kind-group never exists with zero children.
//!
//! Mutation primitives that preserve these invariants live in `edit.rs`.

mod edit;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a node within one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new node ID.
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// The project root always has id 0.
pub const PROJECT_ID: NodeId = NodeId(0);

// ============================================================================
// Enums
// ============================================================================

/// Kind tag of a documented symbol.
///
/// Variant order is the presentation order: kind-groups and children are
/// sorted by [`SymbolKind::priority`] before name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum SymbolKind {
    Project,
    /// File-derived or logical module.
    Module,
    Namespace,
    Enum,
    EnumMember,
    Class,
    Interface,
    TypeAlias,
    Constructor,
    Property,
    #[default]
    Variable,
    Function,
    Accessor,
    Method,
    /// Re-export or alias of another symbol.
    Reference,
}

impl SymbolKind {
    /// Sort priority (lower sorts first).
    pub fn priority(&self) -> u8 {
        match self {
            SymbolKind::Project => 0,
            SymbolKind::Module => 1,
            SymbolKind::Namespace => 2,
            SymbolKind::Enum => 3,
            SymbolKind::EnumMember => 4,
            SymbolKind::Class => 5,
            SymbolKind::Interface => 6,
            SymbolKind::TypeAlias => 7,
            SymbolKind::Constructor => 8,
            SymbolKind::Property => 9,
            SymbolKind::Variable => 10,
            SymbolKind::Function => 11,
            SymbolKind::Accessor => 12,
            SymbolKind::Method => 13,
            SymbolKind::Reference => 14,
        }
    }

    /// Title used for the kind-group that collects symbols of this kind.
    pub fn group_title(&self) -> &'static str {
        match self {
            SymbolKind::Project => "Projects",
            SymbolKind::Module => "Modules",
            SymbolKind::Namespace => "Namespaces",
            SymbolKind::Enum => "Enumerations",
            SymbolKind::EnumMember => "Enumeration Members",
            SymbolKind::Class => "Classes",
            SymbolKind::Interface => "Interfaces",
            SymbolKind::TypeAlias => "Type Aliases",
            SymbolKind::Constructor => "Constructors",
            SymbolKind::Property => "Properties",
            SymbolKind::Variable => "Variables",
            SymbolKind::Function => "Functions",
            SymbolKind::Accessor => "Accessors",
            SymbolKind::Method => "Methods",
            SymbolKind::Reference => "References",
        }
    }
}

/// Structural role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// The single project root.
    Project,
    /// A module container (file-derived grouping or logical module).
    Container,
    /// A documented symbol. May hold children (class members) without being
    /// a module container.
    Declaration,
    /// Non-owning alias of another declaration.
    Reference { target: NodeId },
}

// ============================================================================
// Node Payloads
// ============================================================================

/// A block tag inside a comment (`@module Core` is `{ tag: "module", text: "Core" }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentTag {
    /// Tag name without the leading `@`.
    pub tag: String,
    /// Tag payload.
    #[serde(default)]
    pub text: String,
}

impl CommentTag {
    /// Create a new comment tag.
    pub fn new(tag: impl Into<String>, text: impl Into<String>) -> Self {
        CommentTag {
            tag: tag.into(),
            text: text.into(),
        }
    }
}

/// Comment payload attached to a node by the analysis stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// First paragraph.
    #[serde(default)]
    pub short_text: String,
    /// Remaining body text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Block tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<CommentTag>,
}

impl Comment {
    /// Create a comment with only a short text.
    pub fn new(short_text: impl Into<String>) -> Self {
        Comment {
            short_text: short_text.into(),
            ..Comment::default()
        }
    }

    /// Add a block tag.
    pub fn with_tag(mut self, tag: impl Into<String>, text: impl Into<String>) -> Self {
        self.tags.push(CommentTag::new(tag, text));
        self
    }

    /// True if the comment carries no text and no tags.
    pub fn is_empty(&self) -> bool {
        self.short_text.is_empty() && self.text.is_empty() && self.tags.is_empty()
    }
}

/// Secondary index of a container's children that share one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindGroup {
    /// Kind shared by every member.
    pub kind: SymbolKind,
    /// Display title (e.g. "Classes").
    pub title: String,
    /// Members, in display order.
    pub children: Vec<NodeId>,
}

impl KindGroup {
    /// Create a group seeded with one member.
    pub fn seeded(kind: SymbolKind, first: NodeId) -> Self {
        KindGroup {
            kind,
            title: kind.group_title().to_string(),
            children: vec![first],
        }
    }
}

/// One node of the symbol tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Stable identity.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Kind tag used for grouping and sorting.
    pub kind: SymbolKind,
    /// Structural role.
    pub role: NodeRole,
    /// Comment payload.
    pub comment: Option<Comment>,
    /// Owning node (`None` for the project and for detached nodes).
    pub parent: Option<NodeId>,
    /// Owned children. `None` means the node cannot hold children.
    pub children: Option<Vec<NodeId>>,
    /// Kind-group index. `None` means the node keeps no group index.
    pub groups: Option<Vec<KindGroup>>,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: impl Into<String>, kind: SymbolKind, role: NodeRole) -> Self {
        Node {
            id,
            name: name.into(),
            kind,
            role,
            comment: None,
            parent: None,
            children: None,
            groups: None,
        }
    }

    /// Target of a reference node.
    pub fn target(&self) -> Option<NodeId> {
        match self.role {
            NodeRole::Reference { target } => Some(target),
            _ => None,
        }
    }

    /// True for reference nodes.
    pub fn is_reference(&self) -> bool {
        matches!(self.role, NodeRole::Reference { .. })
    }

    /// True for module containers (not the project, not declarations).
    pub fn is_container(&self) -> bool {
        self.role == NodeRole::Container
    }

    /// Owned children, or an empty slice when the node cannot hold any.
    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// True if the node currently owns at least one child.
    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    /// Kind-groups, or an empty slice when the node keeps no group index.
    pub fn groups(&self) -> &[KindGroup] {
        self.groups.as_deref().unwrap_or(&[])
    }

    /// The group holding members of `kind`, if any.
    pub fn group(&self, kind: SymbolKind) -> Option<&KindGroup> {
        self.groups().iter().find(|g| g.kind == kind)
    }
}

// ============================================================================
// Symbol Tree
// ============================================================================

/// Arena of documentation nodes rooted at a single project.
#[derive(Debug, Clone)]
pub struct SymbolTree {
    nodes: BTreeMap<NodeId, Node>,
    next_node_id: u32,
}

impl SymbolTree {
    /// Create a tree holding only an empty project root.
    pub fn new(project_name: impl Into<String>) -> Self {
        let mut project = Node::new(PROJECT_ID, project_name, SymbolKind::Project, NodeRole::Project);
        project.children = Some(Vec::new());
        project.groups = Some(Vec::new());

        let mut nodes = BTreeMap::new();
        nodes.insert(PROJECT_ID, project);
        SymbolTree {
            nodes,
            next_node_id: 1,
        }
    }

    // ========================================================================
    // ID Generation
    // ========================================================================

    /// Generate the next NodeId.
    pub fn next_node_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// Make sure generated ids never collide with `id`.
    pub(crate) fn reserve_id(&mut self, id: NodeId) {
        if id.0 >= self.next_node_id {
            self.next_node_id = id.0 + 1;
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Look up a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// True if the arena holds `id`.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The project root.
    pub fn project(&self) -> &Node {
        &self.nodes[&PROJECT_ID]
    }

    /// Children of `id` (empty if the node is unknown or childless).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// Top-level children of the project.
    pub fn top_level(&self) -> &[NodeId] {
        self.project().children()
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Display name of `id`.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    /// Number of nodes in the arena, project included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the arena only holds the project.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Iterate all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// First top-level module container named `name`.
    pub fn find_top_level_container(&self, name: &str) -> Option<NodeId> {
        self.top_level().iter().copied().find(|&id| {
            self.node(id)
                .is_some_and(|n| n.is_container() && n.name == name)
        })
    }

    /// True if list entry `entry` denotes `decl`: the same id, or a
    /// reference whose target is `decl`.
    pub fn resolves_to(&self, entry: NodeId, decl: NodeId) -> bool {
        entry == decl || self.node(entry).and_then(Node::target) == Some(decl)
    }

    /// Kind under which `id` is grouped. References group with their target.
    pub fn group_kind(&self, id: NodeId) -> Option<SymbolKind> {
        let node = self.node(id)?;
        match node.target().and_then(|t| self.node(t)) {
            Some(target) => Some(target.kind),
            None => Some(node.kind),
        }
    }

    /// True if `ancestor` is `id` or lies on `id`'s parent chain.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Nearest node on `id`'s parent chain (including `id`) with container role.
    pub fn enclosing_container(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            if node.is_container() {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    /// Node ids reachable from the project, in pre-order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![PROJECT_ID];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Add a module container under `parent`.
    pub fn add_container(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let id = self.next_node_id();
        let mut node = Node::new(id, name, SymbolKind::Module, NodeRole::Container);
        node.children = Some(Vec::new());
        node.groups = Some(Vec::new());
        self.insert_node(node);
        self.attach(parent, id);
        id
    }

    /// Add a declaration under `parent`.
    ///
    /// The declaration starts without a child list; the first child added to it
    /// creates one.
    pub fn add_declaration(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: SymbolKind,
    ) -> NodeId {
        let id = self.next_node_id();
        self.insert_node(Node::new(id, name, kind, NodeRole::Declaration));
        self.attach(parent, id);
        id
    }

    /// Add a reference to `target` under `parent`.
    pub fn add_reference(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        target: NodeId,
    ) -> NodeId {
        let id = self.next_node_id();
        self.insert_node(Node::new(
            id,
            name,
            SymbolKind::Reference,
            NodeRole::Reference { target },
        ));
        self.attach(parent, id);
        id
    }

    /// Set (or clear) a node's comment.
    pub fn set_comment(&mut self, id: NodeId, comment: Option<Comment>) {
        if let Some(node) = self.node_mut(id) {
            node.comment = comment;
        }
    }

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.reserve_id(node.id);
        self.nodes.insert(node.id, node);
    }

    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod model_tests {
        use super::*;

        #[test]
        fn new_tree_has_project_with_group_index() {
            let tree = SymbolTree::new("demo");
            let project = tree.project();
            assert_eq!(project.id, PROJECT_ID);
            assert_eq!(project.role, NodeRole::Project);
            assert!(project.children.is_some());
            assert!(project.groups.is_some());
            assert!(tree.is_empty());
        }

        #[test]
        fn add_nodes_links_parent_and_children() {
            let mut tree = SymbolTree::new("demo");
            let file = tree.add_container(PROJECT_ID, "src/core.ts");
            let class = tree.add_declaration(file, "Engine", SymbolKind::Class);

            assert_eq!(tree.parent(class), Some(file));
            assert_eq!(tree.children(file), &[class]);
            assert_eq!(tree.top_level(), &[file]);
            assert_eq!(tree.len(), 3);
        }

        #[test]
        fn ids_are_sequential() {
            let mut tree = SymbolTree::new("demo");
            let a = tree.add_container(PROJECT_ID, "a");
            let b = tree.add_container(PROJECT_ID, "b");
            assert_eq!(a, NodeId::new(1));
            assert_eq!(b, NodeId::new(2));
        }

        #[test]
        fn reference_resolves_to_target() {
            let mut tree = SymbolTree::new("demo");
            let file = tree.add_container(PROJECT_ID, "a.ts");
            let other = tree.add_container(PROJECT_ID, "b.ts");
            let class = tree.add_declaration(file, "Engine", SymbolKind::Class);
            let alias = tree.add_reference(other, "Engine", class);

            assert!(tree.resolves_to(class, class));
            assert!(tree.resolves_to(alias, class));
            assert!(!tree.resolves_to(file, class));
            assert_eq!(tree.group_kind(alias), Some(SymbolKind::Class));
        }

        #[test]
        fn find_top_level_container_ignores_declarations() {
            let mut tree = SymbolTree::new("demo");
            tree.add_declaration(PROJECT_ID, "Core", SymbolKind::Function);
            assert_eq!(tree.find_top_level_container("Core"), None);

            let core = tree.add_container(PROJECT_ID, "Core");
            assert_eq!(tree.find_top_level_container("Core"), Some(core));
        }

        #[test]
        fn enclosing_container_walks_up() {
            let mut tree = SymbolTree::new("demo");
            let file = tree.add_container(PROJECT_ID, "a.ts");
            let class = tree.add_declaration(file, "Engine", SymbolKind::Class);
            let method = tree.add_declaration(class, "run", SymbolKind::Method);

            assert_eq!(tree.enclosing_container(method), Some(file));
            assert_eq!(tree.enclosing_container(file), Some(file));
            assert_eq!(tree.enclosing_container(PROJECT_ID), None);
            assert!(tree.is_ancestor_or_self(file, method));
            assert!(!tree.is_ancestor_or_self(method, file));
        }

        #[test]
        fn walk_is_preorder() {
            let mut tree = SymbolTree::new("demo");
            let a = tree.add_container(PROJECT_ID, "a");
            let a1 = tree.add_declaration(a, "a1", SymbolKind::Function);
            let b = tree.add_container(PROJECT_ID, "b");

            assert_eq!(tree.walk(), vec![PROJECT_ID, a, a1, b]);
        }
    }

    mod kind_tests {
        use super::*;

        #[test]
        fn priorities_follow_declaration_order() {
            assert!(SymbolKind::Module.priority() < SymbolKind::Class.priority());
            assert!(SymbolKind::Class.priority() < SymbolKind::Function.priority());
            assert!(SymbolKind::Function.priority() < SymbolKind::Reference.priority());
        }

        #[test]
        fn serde_names_are_snake_case() {
            let json = serde_json::to_string(&SymbolKind::TypeAlias).unwrap();
            assert_eq!(json, "\"type_alias\"");
            let kind: SymbolKind = serde_json::from_str("\"enum_member\"").unwrap();
            assert_eq!(kind, SymbolKind::EnumMember);
        }
    }
}
