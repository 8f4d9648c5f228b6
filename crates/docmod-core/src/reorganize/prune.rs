//! Prune phase: dissolve file-derived containers.
//!
//! Untagged children of top-level module containers are promoted to the
//! project, references among them are dropped, and any container left without
//! children is deleted along with every reference that targets it.
//! Containers are visited in reverse top-level order; a nested container
//! promoted along the way is visited after the current one.

use tracing::debug;

use super::ReorganizeContext;
use crate::tree::{NodeId, PROJECT_ID};

/// Run the prune phase.
pub fn run(ctx: &mut ReorganizeContext<'_>) {
    let mut pending: Vec<NodeId> = ctx
        .tree
        .top_level()
        .iter()
        .copied()
        .filter(|&id| ctx.tree.node(id).is_some_and(|n| n.is_container()))
        .collect();

    while let Some(container) = pending.pop() {
        let promoted_containers = migrate_children(ctx, container);
        if ctx.tree.delete_empty(container) {
            debug!("deleted empty container {container}");
            ctx.report.containers_pruned += 1;
            let dropped = ctx.tree.drop_references_to(container);
            if dropped > 0 {
                debug!("dropped {dropped} reference(s) to pruned {container}");
            }
            ctx.report.references_removed += dropped;
        }
        pending.extend(promoted_containers);
    }
}

/// Move every untagged child of `container` to the project.
///
/// Returns the module containers that were promoted, so the caller can
/// dissolve them too.
fn migrate_children(ctx: &mut ReorganizeContext<'_>, container: NodeId) -> Vec<NodeId> {
    let children = ctx.tree.children(container).to_vec();
    let mut promoted_containers = Vec::new();

    for child in children {
        if ctx.tags.is_tagged(child) {
            continue;
        }
        let (is_reference, is_container) = match ctx.tree.node(child) {
            Some(node) => (node.is_reference(), node.is_container()),
            None => continue,
        };
        if is_reference {
            if ctx.tree.drop_reference(child) {
                debug!("dropped reference {child} from {container}");
                ctx.report.references_removed += 1;
            }
            continue;
        }
        if ctx.tree.reparent(child, PROJECT_ID) {
            debug!("promoted {child} from {container} to the project");
            if is_container {
                promoted_containers.push(child);
            } else {
                ctx.report.symbols_promoted += 1;
            }
        }
    }

    promoted_containers
}

// ============================================================================
// Tests
// ============================================================================
