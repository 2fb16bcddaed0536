//! Hoisting engine entry point and fixed-point driver.
//!
//! [`hoist`] clones the caller's graph into a working graph, builds the
//! popularity index, and then walks the graph top-down. Every visited node
//! acts in turn as a hoist root: the candidate finder and the applier run in
//! alternation until a pass promotes nothing, after which the walk recurses
//! into the root's children. Promotions monotonically reduce the number of
//! distinct instances below a root, so each fixed point terminates. A final
//! projection shrinks the working graph to the caller-facing result shape.

pub(crate) mod ancestry;
pub(crate) mod apply;
pub(crate) mod candidates;

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

use derrick_core::error::DerrickError;
use derrick_core::types::Locator;

use crate::dump;
use crate::tree::{DependencyTree, HoistedTree, OutputNode, OutputNodeId};
use crate::verify;
use crate::work::{WorkGraph, WorkNodeId};
use crate::HoistResult;

use ancestry::AncestorIndex;
use candidates::{FinderInput, Rejection};

/// Environment fallback for the debug level when the caller passes none
const DEBUG_LEVEL_ENV: &str = "NM_DEBUG_LEVEL";

/// Tuning knobs for [`hoist`]
#[derive(Debug, Clone, Default)]
pub struct HoistOptions {
    /// Validate the whole layout after every single promotion
    pub check: bool,
    /// Diagnostic verbosity; `None` falls back to `NM_DEBUG_LEVEL`, then -1.
    ///
    /// At 0 the total elapsed time is logged, at 1 a final layout check runs,
    /// at 2 rejection reasons are collected and the tree is dumped, at 9 the
    /// per-promotion check is forced on.
    pub debug_level: Option<i32>,
}

struct Settings {
    debug_level: i32,
    check: bool,
}

/// Hoist duplicate instances in `tree` as close to the root as the regular-
/// and peer-dependency promises allow
pub fn hoist(tree: &DependencyTree, options: &HoistOptions) -> HoistResult<HoistedTree> {
    let start = Instant::now();
    let debug_level = options
        .debug_level
        .or_else(debug_level_from_env)
        .unwrap_or(-1);
    let settings = Settings {
        debug_level,
        check: options.check || debug_level >= 9,
    };

    let mut graph = WorkGraph::from_input(tree);
    let ancestor_index = ancestry::build_ancestor_index(&graph);

    let mut seen_roots: HashSet<WorkNodeId> = HashSet::new();
    let mut root_path_locators: IndexSet<Locator> = IndexSet::new();
    root_path_locators.insert(graph.node(graph.root).locator.clone());
    let ancestor_deps = visible_dependencies(&graph, graph.root, &IndexMap::new());
    let root = graph.root;
    hoist_to(
        &mut graph,
        root,
        &mut root_path_locators,
        ancestor_deps,
        &ancestor_index,
        &settings,
        &mut seen_roots,
    )?;

    if settings.debug_level >= 0 {
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "hoisting finished"
        );
    }
    if settings.debug_level >= 1 {
        let log = verify::self_check(&graph);
        if !log.is_empty() {
            return Err(DerrickError::LayoutCheckFailed {
                log,
                dump: dump::dump_graph(&graph),
            });
        }
    }
    if settings.debug_level >= 2 {
        debug!("hoisted tree:\n{}", dump::dump_graph(&graph));
    }

    Ok(shrink(&graph))
}

fn debug_level_from_env() -> Option<i32> {
    std::env::var(DEBUG_LEVEL_ENV).ok()?.trim().parse().ok()
}

/// Resolutions seen at `node_id`: the parent's map overlaid with the node's
/// own non-peer children
pub(crate) fn visible_dependencies(
    graph: &WorkGraph,
    node_id: WorkNodeId,
    parent_deps: &IndexMap<String, WorkNodeId>,
) -> IndexMap<String, WorkNodeId> {
    let mut visible = parent_deps.clone();
    let node = graph.node(node_id);
    for (name, &dep) in &node.dependencies {
        if !node.peer_names.contains(name) {
            visible.insert(name.clone(), dep);
        }
    }
    visible
}

#[allow(clippy::too_many_arguments)]
fn hoist_to(
    graph: &mut WorkGraph,
    root: WorkNodeId,
    root_path_locators: &mut IndexSet<Locator>,
    mut ancestor_deps: IndexMap<String, WorkNodeId>,
    ancestor_index: &AncestorIndex,
    settings: &Settings,
    seen_roots: &mut HashSet<WorkNodeId>,
) -> HoistResult<()> {
    if !seen_roots.insert(root) {
        return Ok(());
    }

    loop {
        let (found, rejections) = candidates::find_candidates(&FinderInput {
            graph: &*graph,
            ancestor_index,
            root,
            root_path_locators: &*root_path_locators,
            ancestor_deps: &ancestor_deps,
            record_reasons: settings.debug_level >= 2,
        });
        record_rejections(graph, rejections);
        if found.is_empty() {
            break;
        }
        let promoted =
            apply::apply_candidates(graph, root, found, &mut ancestor_deps, settings.check)?;
        if promoted == 0 {
            break;
        }
    }

    let children: Vec<WorkNodeId> = {
        let node = graph.node(root);
        node.dependencies
            .iter()
            .filter(|(name, _)| !node.peer_names.contains(*name))
            .map(|(_, &child)| child)
            .collect()
    };
    for child in children {
        let child_locator = graph.node(child).locator.clone();
        if root_path_locators.contains(&child_locator) {
            continue;
        }
        let child_deps = visible_dependencies(graph, child, &ancestor_deps);
        root_path_locators.insert(child_locator.clone());
        hoist_to(
            graph,
            child,
            root_path_locators,
            child_deps,
            ancestor_index,
            settings,
            seen_roots,
        )?;
        root_path_locators.shift_remove(&child_locator);
    }
    Ok(())
}

/// Attach rejection notes gathered by the finder. A reason recorded by a
/// different root is left in place; the root that just tried again overwrites
/// its own verdict.
fn record_rejections(graph: &mut WorkGraph, rejections: Vec<Rejection>) {
    for (parent, name, reason) in rejections {
        let reasons = &mut graph.node_mut(parent).reasons;
        match reasons.get(&name) {
            Some(existing) if existing.root != reason.root => {}
            _ => {
                reasons.insert(name, reason);
            }
        }
    }
}

/// Project the working graph back to the caller-facing shape, memoized per
/// work node so shared nodes and cycles come out shared
fn shrink(graph: &WorkGraph) -> HoistedTree {
    let mut result = HoistedTree {
        root: OutputNodeId(0),
        packages: Vec::new(),
    };
    let mut memo: HashMap<WorkNodeId, OutputNodeId> = HashMap::new();
    result.root = project(graph, graph.root, &mut result, &mut memo);
    result
}

fn project(
    graph: &WorkGraph,
    id: WorkNodeId,
    result: &mut HoistedTree,
    memo: &mut HashMap<WorkNodeId, OutputNodeId>,
) -> OutputNodeId {
    if let Some(&projected) = memo.get(&id) {
        return projected;
    }
    let node = graph.node(id);
    let out_id = OutputNodeId(result.packages.len() as u32);
    result.packages.push(OutputNode {
        name: node.name.clone(),
        references: node.references.clone(),
        dependencies: Vec::new(),
    });
    memo.insert(id, out_id);
    for (name, &child) in &node.dependencies {
        if node.peer_names.contains(name) {
            continue;
        }
        let child_out = project(graph, child, result, memo);
        result.packages[out_id.0 as usize].dependencies.push(child_out);
    }
    out_id
}
