//! Sort phase: deterministic ordering of children and kind-groups.
//!
//! Children are ordered by kind priority, then case-insensitive name. The sort
//! is stable, so ties keep their current relative order. Kind-groups are
//! ordered by the priority of their kind.

use crate::tree::{NodeId, SymbolTree, PROJECT_ID};

/// Sort the whole tree.
pub fn run(tree: &mut SymbolTree) {
    sort_subtree(tree, PROJECT_ID);
}

/// Sort `id` and every node below it.
pub fn sort_subtree(tree: &mut SymbolTree, id: NodeId) {
    let children = tree.children(id).to_vec();
    for &child in &children {
        if tree.node(child).is_some_and(|n| n.has_children()) {
            sort_subtree(tree, child);
        }
    }

    let sorted_children = sorted(tree, children);
    let mut sorted_groups = tree.node(id).and_then(|n| n.groups.clone());
    if let Some(groups) = sorted_groups.as_mut() {
        for group in groups.iter_mut() {
            group.children = sorted(tree, std::mem::take(&mut group.children));
        }
        groups.sort_by_key(|g| g.kind.priority());
    }

    if let Some(node) = tree.node_mut(id) {
        if let Some(children) = node.children.as_mut() {
            *children = sorted_children;
        }
        node.groups = sorted_groups;
    }
}

/// Ordering key: kind priority, then lowercase name.
fn sort_key(tree: &SymbolTree, id: NodeId) -> (u8, String) {
    tree.node(id)
        .map(|n| (n.kind.priority(), n.name.to_lowercase()))
        .unwrap_or((u8::MAX, String::new()))
}

fn sorted(tree: &SymbolTree, mut ids: Vec<NodeId>) -> Vec<NodeId> {
    ids.sort_by_cached_key(|&id| sort_key(tree, id));
    ids
}

// ============================================================================
// Tests
// ============================================================================
