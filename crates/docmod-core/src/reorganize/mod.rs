//! Logical-module reorganization of the symbol tree.
//!
//! [`reorganize`] runs three phases, always in this order:
//!
//! 1. **convert** ([`convert`]): every `@module` declaration is moved into its
//!    logical module, which is reused, promoted from a `@moduledefinition`
//!    container, or synthesized as a fallback.
//! 2. **prune** ([`prune`]): untagged symbols left in file-derived containers
//!    are promoted to the project and emptied containers are deleted.
//! 3. **sort** ([`sort`]): children and kind-groups are ordered by kind
//!    priority, then case-insensitive name.
//!
//! The pass is synchronous and infallible. Problems that the pass can recover
//! from are logged through `tracing` and recorded in the returned
//! [`ReorganizeReport`].

pub mod convert;
pub mod prune;
pub mod sort;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::output::Warning;
use crate::tags::ModuleTags;
use crate::tree::SymbolTree;

// ============================================================================
// Options
// ============================================================================

/// Knobs for one reorganization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorganizeOptions {
    /// Give synthesized fallback containers a kind-group index.
    ///
    /// Off by default: a fallback container then lists its children without
    /// kind-groups.
    pub populate_fallback_groups: bool,
}

impl ReorganizeOptions {
    /// Default options.
    pub fn new() -> Self {
        ReorganizeOptions::default()
    }

    /// Enable or disable group indexes on fallback containers.
    pub fn with_populate_fallback_groups(mut self, enabled: bool) -> Self {
        self.populate_fallback_groups = enabled;
        self
    }
}

// ============================================================================
// Report
// ============================================================================

/// Counts and warnings produced by one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorganizeReport {
    /// `@moduledefinition` containers promoted to the top level.
    pub modules_promoted: usize,
    /// Fallback containers created for undefined module names.
    pub modules_synthesized: usize,
    /// Tagged declarations whose parent changed.
    pub declarations_moved: usize,
    /// Untagged symbols promoted to the project during prune.
    pub symbols_promoted: usize,
    /// Reference nodes removed from the tree.
    pub references_removed: usize,
    /// Emptied containers deleted during prune.
    pub containers_pruned: usize,
    /// Recoverable problems.
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

impl ReorganizeReport {
    /// True if the pass changed nothing and warned about nothing.
    pub fn is_noop(&self) -> bool {
        self == &ReorganizeReport::default()
    }
}

// ============================================================================
// Context
// ============================================================================

/// State shared by the three phases.
pub struct ReorganizeContext<'a> {
    /// Tree being reorganized.
    pub tree: &'a mut SymbolTree,
    /// Collected module records.
    pub tags: &'a ModuleTags,
    /// Pass options.
    pub options: ReorganizeOptions,
    /// Report being accumulated.
    pub report: ReorganizeReport,
}

impl<'a> ReorganizeContext<'a> {
    /// Create a context with an empty report.
    pub fn new(tree: &'a mut SymbolTree, tags: &'a ModuleTags, options: ReorganizeOptions) -> Self {
        ReorganizeContext {
            tree,
            tags,
            options,
            report: ReorganizeReport::default(),
        }
    }

    /// Finish the pass and hand back the report.
    pub fn into_report(self) -> ReorganizeReport {
        self.report
    }
}

// ============================================================================
// Entry Point
// ============================================================================

/// Reorganize `tree` by logical module.
pub fn reorganize(
    tree: &mut SymbolTree,
    tags: &ModuleTags,
    options: ReorganizeOptions,
) -> ReorganizeReport {
    let mut ctx = ReorganizeContext::new(tree, tags, options);

    {
        let _span = info_span!("convert", declarations = tags.declarations.len()).entered();
        convert::run(&mut ctx);
    }
    {
        let _span = info_span!("prune").entered();
        prune::run(&mut ctx);
    }
    {
        let _span = info_span!("sort").entered();
        sort::run(ctx.tree);
    }

    let report = ctx.into_report();
    info!(
        promoted = report.modules_promoted,
        synthesized = report.modules_synthesized,
        moved = report.declarations_moved,
        lifted = report.symbols_promoted,
        references = report.references_removed,
        pruned = report.containers_pruned,
        warnings = report.warnings.len(),
        "reorganization complete"
    );
    report
}

// ============================================================================
// Tests
// ============================================================================
