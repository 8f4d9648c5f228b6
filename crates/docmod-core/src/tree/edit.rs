//! Mutation primitives for the symbol tree.
//!
//! Every structural change goes through these methods so that ownership and
//! kind-group membership stay consistent:
//! - [`SymbolTree::attach`]: add to a parent's children and matching group
//! - [`SymbolTree::detach`]: remove from the current parent's structures
//! - [`SymbolTree::reparent`]: detach, then attach
//! - [`SymbolTree::remove_from_container`]: strip a declaration and any
//!   reference to it from one container
//!
//! A reparent is always remove-then-add, so a node is never listed under two
//! owners at once.

use tracing::debug;

use super::{KindGroup, NodeId, SymbolTree};

impl SymbolTree {
    /// Index of the entry in `list` that denotes `decl`.
    ///
    /// The declaration itself wins over a reference to it.
    pub fn find_entry(&self, list: &[NodeId], decl: NodeId) -> Option<usize> {
        list.iter()
            .position(|&e| e == decl)
            .or_else(|| list.iter().position(|&e| self.resolves_to(e, decl)))
    }

    /// Make `child` a child of `parent`.
    ///
    /// If `parent` already lists `child`, nothing changes. If it lists a
    /// reference to `child`, the reference is replaced in place and dropped
    /// from the arena. The parent's kind-group index is updated the same way.
    ///
    /// Returns the reference that was replaced, if any.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        if parent == child || !self.contains(child) {
            return None;
        }
        let node = self.node_mut(parent)?;
        if node.children.is_none() {
            node.children = Some(Vec::new());
            node.groups = Some(Vec::new());
        }

        let slot = self.find_entry(self.children(parent), child);
        let replaced = slot
            .map(|i| self.children(parent)[i])
            .filter(|&entry| entry != child);

        self.register_in_group(parent, child);

        if let Some(children) = self.node_mut(parent).and_then(|n| n.children.as_mut()) {
            match slot {
                Some(i) => children[i] = child,
                None => children.push(child),
            }
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(reference) = replaced {
            debug!("replaced {reference} with {child} in {parent}");
            self.remove_node(reference);
        }
        replaced
    }

    /// Record `member` in the kind-group of `container` that matches its kind.
    ///
    /// Containers without a group index are left untouched. A reference to
    /// `member` in the group is replaced in place; a missing group is created
    /// at its kind-priority position.
    pub fn register_in_group(&mut self, container: NodeId, member: NodeId) {
        let Some(kind) = self.group_kind(member) else {
            return;
        };
        let Some(groups) = self.node(container).and_then(|n| n.groups.as_ref()) else {
            return;
        };

        let existing = groups
            .iter()
            .position(|g| g.kind == kind)
            .map(|gi| (gi, self.find_entry(&groups[gi].children, member)));
        let insert_at = groups
            .iter()
            .position(|g| g.kind.priority() > kind.priority())
            .unwrap_or(groups.len());

        let Some(groups) = self.node_mut(container).and_then(|n| n.groups.as_mut()) else {
            return;
        };
        match existing {
            Some((gi, Some(i))) => groups[gi].children[i] = member,
            Some((gi, None)) => groups[gi].children.push(member),
            None => groups.insert(insert_at, KindGroup::seeded(kind, member)),
        }
    }

    /// Rebuild `container`'s kind-groups from its children, in child order.
    ///
    /// Containers without a group index are left untouched.
    pub fn rebuild_groups(&mut self, container: NodeId) {
        let Some(node) = self.node(container) else {
            return;
        };
        if node.groups.is_none() {
            return;
        }
        let mut groups: Vec<KindGroup> = Vec::new();
        for &member in node.children() {
            let Some(kind) = self.group_kind(member) else {
                continue;
            };
            match groups.iter_mut().find(|g| g.kind == kind) {
                Some(group) => group.children.push(member),
                None => {
                    let at = groups
                        .iter()
                        .position(|g| g.kind.priority() > kind.priority())
                        .unwrap_or(groups.len());
                    groups.insert(at, KindGroup::seeded(kind, member));
                }
            }
        }
        if let Some(node) = self.node_mut(container) {
            node.groups = Some(groups);
        }
    }

    /// Remove `id` from its parent's children and kind-groups.
    ///
    /// Returns the former parent.
    pub fn detach(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        self.unlist(parent, &[id]);
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
        Some(parent)
    }

    /// Move `id` under `new_parent`.
    ///
    /// Returns `true` if the parent changed. Re-attaching to the current
    /// parent only repairs group membership. A move that would make a node
    /// its own ancestor is refused.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> bool {
        if self.is_ancestor_or_self(id, new_parent) {
            debug!("refusing to move {id} under its own descendant {new_parent}");
            return false;
        }
        let moved = self.parent(id) != Some(new_parent);
        if moved {
            self.detach(id);
        }
        self.attach(new_parent, id);
        moved
    }

    /// Strip `decl`, and every reference to it, from `container`.
    ///
    /// Removes matching entries from both the child sequence and the
    /// kind-groups, deleting groups left empty. Removed references are dropped
    /// from the arena. Returns the number of references removed.
    pub fn remove_from_container(&mut self, container: NodeId, decl: NodeId) -> usize {
        let Some(node) = self.node(container) else {
            return 0;
        };
        let mut doomed: Vec<NodeId> = node
            .children()
            .iter()
            .chain(node.groups().iter().flat_map(|g| g.children.iter()))
            .copied()
            .filter(|&entry| self.resolves_to(entry, decl))
            .collect();
        doomed.sort();
        doomed.dedup();
        if doomed.is_empty() {
            return 0;
        }

        self.unlist(container, &doomed);

        let mut references = 0;
        for entry in doomed {
            if entry == decl {
                if let Some(node) = self.node_mut(decl).filter(|n| n.parent == Some(container)) {
                    node.parent = None;
                }
            } else {
                self.remove_node(entry);
                references += 1;
            }
        }
        references
    }

    /// Detach a reference node and drop it from the arena.
    pub fn drop_reference(&mut self, id: NodeId) -> bool {
        if !self.node(id).is_some_and(|n| n.is_reference()) {
            return false;
        }
        self.detach(id);
        self.remove_node(id);
        true
    }

    /// Drop every reference whose target is `target`.
    ///
    /// Returns the number of references dropped.
    pub fn drop_references_to(&mut self, target: NodeId) -> usize {
        let doomed: Vec<NodeId> = self
            .nodes()
            .filter(|n| n.target() == Some(target))
            .map(|n| n.id)
            .collect();
        doomed
            .into_iter()
            .filter(|&id| self.drop_reference(id))
            .count()
    }

    /// Detach a childless node and drop it from the arena.
    ///
    /// Returns `false` (and changes nothing) if the node still owns children.
    pub fn delete_empty(&mut self, id: NodeId) -> bool {
        match self.node(id) {
            Some(node) if !node.has_children() => {}
            _ => return false,
        }
        self.detach(id);
        self.remove_node(id);
        true
    }

    /// Rename a node.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.name = name.into();
        }
    }

    /// Remove `doomed` entries from `container`'s children and groups.
    fn unlist(&mut self, container: NodeId, doomed: &[NodeId]) {
        let Some(node) = self.node_mut(container) else {
            return;
        };
        if let Some(children) = node.children.as_mut() {
            children.retain(|e| !doomed.contains(e));
        }
        if let Some(groups) = node.groups.as_mut() {
            for group in groups.iter_mut() {
                group.children.retain(|e| !doomed.contains(e));
            }
            groups.retain(|g| !g.children.is_empty());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
