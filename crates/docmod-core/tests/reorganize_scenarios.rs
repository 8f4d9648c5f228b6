//! End-to-end reorganization scenarios and tree invariants.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

use docmod_core::reorganize::{reorganize, ReorganizeOptions, ReorganizeReport};
use docmod_core::tags::TagCollector;
use docmod_core::tree::{Comment, NodeId, SymbolKind, SymbolTree, PROJECT_ID};

// ============================================================================
// Helpers
// ============================================================================

fn tagged(short_text: &str, tag: &str, name: &str) -> Option<Comment> {
    Some(Comment::new(short_text).with_tag(tag, format!("\"{name}\"")))
}

fn run(tree: &mut SymbolTree) -> ReorganizeReport {
    let tags = TagCollector::new().collect(tree);
    reorganize(tree, &tags, ReorganizeOptions::new())
}

fn top_level_names(tree: &SymbolTree) -> Vec<String> {
    tree.top_level()
        .iter()
        .filter_map(|&id| tree.name(id).map(str::to_string))
        .collect()
}

/// Every reachable node is listed by exactly one parent, and that parent is
/// the one its `parent` field names.
fn assert_single_ownership(tree: &SymbolTree) {
    let mut owners: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for id in tree.walk() {
        for &child in tree.children(id) {
            owners.entry(child).or_default().push(id);
        }
    }
    for id in tree.walk().into_iter().filter(|&id| id != PROJECT_ID) {
        let listed_by = owners.get(&id).cloned().unwrap_or_default();
        assert_eq!(listed_by.len(), 1, "{id} is listed by {listed_by:?}");
        assert_eq!(tree.parent(id), Some(listed_by[0]), "{id} has a stale parent");
    }
}

/// Groups are never empty, and when a node keeps a group index every child is
/// in exactly one group and every group member is a child.
fn assert_groups_consistent(tree: &SymbolTree) {
    for id in tree.walk() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        for group in node.groups() {
            assert!(!group.children.is_empty(), "{id} has empty group {:?}", group.kind);
            for member in &group.children {
                assert!(node.children().contains(member), "{member} grouped but not a child of {id}");
            }
        }
        if node.groups.is_some() {
            for child in node.children() {
                let hits = node
                    .groups()
                    .iter()
                    .filter(|g| g.children.contains(child))
                    .count();
                assert_eq!(hits, 1, "{child} is in {hits} groups of {id}");
            }
        }
    }
}

fn assert_no_empty_top_level_containers(tree: &SymbolTree) {
    for &id in tree.top_level() {
        let node = tree.node(id).expect("top-level node exists");
        if node.is_container() {
            assert!(node.has_children(), "empty container {} survived", node.name);
        }
    }
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer lock")).into_owned()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

struct ScenarioA {
    tree: SymbolTree,
    core_file: NodeId,
    utils_file: NodeId,
    app_file: NodeId,
    app: NodeId,
    kernel: NodeId,
}

/// `src/core.ts` defines Core, `src/utils.ts` defines Utils, and
/// `src/app.ts` holds a class tagged for Core.
fn scenario_a() -> ScenarioA {
    let mut tree = SymbolTree::new("demo");

    let core_file = tree.add_container(PROJECT_ID, "src/core.ts");
    tree.set_comment(core_file, tagged("Core runtime.", "moduledefinition", "Core"));
    let kernel = tree.add_declaration(core_file, "Kernel", SymbolKind::Class);
    tree.set_comment(kernel, tagged("", "module", "Core"));

    let utils_file = tree.add_container(PROJECT_ID, "src/utils.ts");
    tree.set_comment(utils_file, tagged("Helpers.", "moduledefinition", "Utils"));
    let clamp = tree.add_declaration(utils_file, "clamp", SymbolKind::Function);
    tree.set_comment(clamp, tagged("", "module", "Utils"));

    let app_file = tree.add_container(PROJECT_ID, "src/app.ts");
    let app = tree.add_declaration(app_file, "App", SymbolKind::Class);
    tree.set_comment(app, tagged("The app.", "module", "Core"));

    ScenarioA {
        tree,
        core_file,
        utils_file,
        app_file,
        app,
        kernel,
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_a_tagged_class_joins_defined_module() {
    let ScenarioA {
        mut tree,
        core_file,
        utils_file,
        app_file,
        app,
        kernel,
    } = scenario_a();

    let report = run(&mut tree);

    assert_eq!(top_level_names(&tree), vec!["Core", "Utils"]);
    assert_eq!(tree.top_level(), &[core_file, utils_file]);
    assert_eq!(tree.children(core_file), &[app, kernel]);
    assert_eq!(tree.parent(app), Some(core_file));
    assert!(!tree.contains(app_file));

    let core = tree.node(core_file).unwrap();
    assert_eq!(core.comment.as_ref().unwrap().short_text, "Core runtime.");
    assert_eq!(core.group(SymbolKind::Class).unwrap().children, vec![app, kernel]);

    assert_eq!(report.modules_promoted, 2);
    assert_eq!(report.containers_pruned, 1);
    assert!(report.warnings.is_empty());

    assert_single_ownership(&tree);
    assert_groups_consistent(&tree);
    assert_no_empty_top_level_containers(&tree);
}

#[test]
fn scenario_b_untagged_function_is_promoted() {
    let mut tree = SymbolTree::new("demo");
    let file = tree.add_container(PROJECT_ID, "src/math.ts");
    let func = tree.add_declaration(file, "lerp", SymbolKind::Function);
    tree.set_comment(func, Some(Comment::new("Linear interpolation.")));

    let report = run(&mut tree);

    assert_eq!(tree.top_level(), &[func]);
    assert_eq!(tree.parent(func), Some(PROJECT_ID));
    assert!(!tree.contains(file));
    assert_eq!(report.symbols_promoted, 1);
    assert_eq!(report.containers_pruned, 1);

    assert_single_ownership(&tree);
    assert_groups_consistent(&tree);
}

#[test]
fn scenario_c_undefined_module_warns_and_falls_back() {
    let mut tree = SymbolTree::new("demo");
    let file = tree.add_container(PROJECT_ID, "src/button.ts");
    let button = tree.add_declaration(file, "Button", SymbolKind::Class);
    tree.set_comment(button, tagged("A button.", "module", "Widgets"));

    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    let report = tracing::subscriber::with_default(subscriber, || run(&mut tree));

    let widgets = tree
        .find_top_level_container("Widgets")
        .expect("fallback container");
    assert_eq!(tree.children(widgets), &[button]);
    assert!(tree.node(widgets).unwrap().groups.is_none());
    assert!(!tree.contains(file));

    assert_eq!(report.modules_synthesized, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].code, "unresolved_module");
    assert!(report.warnings[0].message.contains("Widgets"));

    let logged = log.contents();
    assert!(logged.contains("WARN"), "log was: {logged}");
    assert!(logged.contains("Widgets"), "log was: {logged}");

    assert_single_ownership(&tree);
    assert_groups_consistent(&tree);
}

#[test]
fn scenario_c_with_populated_fallback_groups() {
    let mut tree = SymbolTree::new("demo");
    let file = tree.add_container(PROJECT_ID, "src/button.ts");
    let button = tree.add_declaration(file, "Button", SymbolKind::Class);
    tree.set_comment(button, tagged("", "module", "Widgets"));

    let tags = TagCollector::new().collect(&mut tree);
    reorganize(
        &mut tree,
        &tags,
        ReorganizeOptions::new().with_populate_fallback_groups(true),
    );

    let widgets = tree.find_top_level_container("Widgets").unwrap();
    let classes = tree.node(widgets).unwrap().group(SymbolKind::Class).unwrap();
    assert_eq!(classes.children, vec![button]);
    assert_groups_consistent(&tree);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn rerunning_is_a_noop() {
    let ScenarioA { mut tree, .. } = scenario_a();
    let tags = TagCollector::new().collect(&mut tree);
    reorganize(&mut tree, &tags, ReorganizeOptions::new());
    let first = tree.to_document();

    let second_report = reorganize(&mut tree, &tags, ReorganizeOptions::new());

    assert!(second_report.is_noop(), "second pass: {second_report:?}");
    assert_eq!(tree.to_document(), first);
}

#[test]
fn reexport_in_target_module_is_deduplicated() {
    let ScenarioA {
        mut tree,
        core_file,
        app,
        ..
    } = scenario_a();
    let alias = tree.add_reference(core_file, "App", app);
    let index = tree.add_container(PROJECT_ID, "src/index.ts");
    let index_alias = tree.add_reference(index, "App", app);

    let report = run(&mut tree);

    assert!(!tree.contains(alias));
    assert!(!tree.contains(index_alias));
    assert!(!tree.contains(index));
    let classes = &tree.node(core_file).unwrap().group(SymbolKind::Class).unwrap().children;
    assert_eq!(classes.iter().filter(|&&id| id == app).count(), 1);
    assert!(classes.iter().all(|&id| !tree.node(id).unwrap().is_reference()));
    assert_eq!(report.references_removed, 2);

    assert_single_ownership(&tree);
    assert_groups_consistent(&tree);
}

#[test]
fn reexported_file_module_leaves_no_dangling_reference() {
    let mut tree = SymbolTree::new("demo");
    let utils_file = tree.add_container(PROJECT_ID, "src/utils.ts");
    let clamp = tree.add_declaration(utils_file, "clamp", SymbolKind::Function);
    let index = tree.add_container(PROJECT_ID, "src/index.ts");
    let nested_alias = tree.add_reference(index, "utils", utils_file);
    let top_alias = tree.add_reference(PROJECT_ID, "utils", utils_file);

    let report = run(&mut tree);

    assert!(!tree.contains(utils_file));
    assert!(!tree.contains(top_alias));
    assert!(!tree.contains(nested_alias));
    assert_eq!(tree.top_level(), &[clamp]);
    assert!(tree.project().group(SymbolKind::Module).is_none());
    assert_eq!(report.references_removed, 2);
    assert_eq!(report.containers_pruned, 2);

    let reloaded = SymbolTree::from_document(&tree.to_document());
    assert!(reloaded.is_ok(), "output does not reload: {reloaded:?}");
    assert_single_ownership(&tree);
    assert_groups_consistent(&tree);
}

#[test]
fn untagged_members_of_a_defined_module_are_promoted() {
    let ScenarioA {
        mut tree,
        core_file,
        ..
    } = scenario_a();
    let helper = tree.add_declaration(core_file, "debugDump", SymbolKind::Function);

    run(&mut tree);

    assert_eq!(tree.parent(helper), Some(PROJECT_ID));
    assert_eq!(top_level_names(&tree), vec!["Core", "Utils", "debugDump"]);
    assert_no_empty_top_level_containers(&tree);
}

#[test]
fn output_order_is_deterministic() {
    let build = || {
        let mut tree = SymbolTree::new("demo");
        let file = tree.add_container(PROJECT_ID, "src/mixed.ts");
        for (name, kind) in [
            ("zed", SymbolKind::Function),
            ("Alpha", SymbolKind::Interface),
            ("beta", SymbolKind::Variable),
            ("Color", SymbolKind::Enum),
            ("alpha", SymbolKind::Function),
        ] {
            tree.add_declaration(file, name, kind);
        }
        tree
    };

    let mut first = build();
    let mut second = build();
    run(&mut first);
    run(&mut second);

    assert_eq!(first.to_document(), second.to_document());
    assert_eq!(
        top_level_names(&first),
        vec!["Color", "Alpha", "beta", "alpha", "zed"]
    );
}

#[test]
fn class_members_stay_with_their_class() {
    let mut tree = SymbolTree::new("demo");
    let core_file = tree.add_container(PROJECT_ID, "src/core.ts");
    tree.set_comment(core_file, tagged("", "moduledefinition", "Core"));
    let other = tree.add_container(PROJECT_ID, "src/engine.ts");
    let engine = tree.add_declaration(other, "Engine", SymbolKind::Class);
    tree.set_comment(engine, tagged("", "module", "Core"));
    let stop = tree.add_declaration(engine, "stop", SymbolKind::Method);
    let start = tree.add_declaration(engine, "start", SymbolKind::Method);

    run(&mut tree);

    assert_eq!(tree.parent(engine), Some(core_file));
    assert_eq!(tree.children(engine), &[start, stop]);
    assert_single_ownership(&tree);
    assert_groups_consistent(&tree);
}
