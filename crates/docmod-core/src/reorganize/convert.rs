//! Convert phase: move every `@module` declaration into its logical module.

use tracing::{debug, warn};

use super::ReorganizeContext;
use crate::output::Warning;
use crate::tree::{Comment, NodeId, PROJECT_ID};

/// Warning code for a `@module` name without a matching `@moduledefinition`.
pub const UNRESOLVED_MODULE: &str = "unresolved_module";

/// Run the convert phase.
///
/// Declarations are processed in ascending id order. Records whose
/// declaration is no longer in the tree are skipped.
pub fn run(ctx: &mut ReorganizeContext<'_>) {
    let tags = ctx.tags;
    for (&decl, record) in &tags.declarations {
        if !ctx.tree.contains(decl) {
            debug!("skipping @module {:?}: {decl} is not in the tree", record.name);
            continue;
        }
        let target = resolve_module(ctx, &record.name, decl);
        relocate(ctx, decl, target);
    }
}

/// Find or create the top-level container for logical module `name`.
///
/// An existing top-level container with that name wins, then the first
/// `@moduledefinition` registered under it, then a synthesized fallback.
/// `decl` is the declaration asking for the module; a fallback warning
/// points at it.
pub fn resolve_module(ctx: &mut ReorganizeContext<'_>, name: &str, decl: NodeId) -> NodeId {
    if let Some(existing) = ctx.tree.find_top_level_container(name) {
        return existing;
    }

    if let Some(definition) = ctx.tags.find_definition(name) {
        let container = definition.container;
        let promotable = ctx.tree.node(container).is_some_and(|n| n.is_container());
        if promotable {
            ctx.tree.reparent(container, PROJECT_ID);
            ctx.tree.rename(container, name);
            if !definition.comment.is_empty() {
                if let Some(node) = ctx.tree.node_mut(container) {
                    node.comment.get_or_insert_with(Comment::default).short_text =
                        definition.comment.clone();
                }
            }
            ctx.report.modules_promoted += 1;
            debug!("promoted {container} to logical module {name:?}");
            return container;
        }
        debug!("definition container {container} for {name:?} is gone");
    }

    let container = ctx.tree.add_container(PROJECT_ID, name);
    if !ctx.options.populate_fallback_groups {
        if let Some(node) = ctx.tree.node_mut(container) {
            node.groups = None;
        }
    }
    warn!("no @moduledefinition for module {name:?}; created an empty container");
    ctx.report.warnings.push(
        Warning::new(
            UNRESOLVED_MODULE,
            format!("module {name:?} is referenced by @module but never defined"),
        )
        .with_node(decl)
        .with_suggestion(format!("add `@moduledefinition {name}` to the file that owns it")),
    );
    ctx.report.modules_synthesized += 1;
    container
}

/// Strip `decl` from every other top-level container and parent it under
/// `target`.
fn relocate(ctx: &mut ReorganizeContext<'_>, decl: NodeId, target: NodeId) {
    if ctx.tree.is_ancestor_or_self(decl, target) {
        debug!("skipping {decl}: it contains its own module {target}");
        return;
    }

    let others: Vec<NodeId> = ctx
        .tree
        .top_level()
        .iter()
        .copied()
        .filter(|&id| id != target)
        .collect();
    for container in others {
        let removed = ctx.tree.remove_from_container(container, decl);
        if removed > 0 {
            debug!("removed {removed} reference(s) to {decl} from {container}");
        }
        ctx.report.references_removed += removed;
    }

    let moved = ctx.tree.parent(decl) != Some(target);
    if moved {
        ctx.tree.detach(decl);
    }
    if let Some(reference) = ctx.tree.attach(target, decl) {
        debug!("{decl} replaced reference {reference} in {target}");
        ctx.report.references_removed += 1;
    }
    if moved {
        debug!("moved {decl} into {target}");
        ctx.report.declarations_moved += 1;
    }
}

// ============================================================================
// Tests
// ============================================================================
