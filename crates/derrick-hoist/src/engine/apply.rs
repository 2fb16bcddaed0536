//! Applies a batch of promotions to the working graph.
//!
//! Intermediates on a promotion path are copy-on-write: the first traversal
//! through an intermediate in a pass produces a shallow clone spliced into
//! its parent, and every later path sharing the prefix reuses that clone.
//! Subtrees that reference the original intermediate from elsewhere keep
//! seeing the pre-promotion view.

use indexmap::IndexMap;
use std::collections::HashMap;

use derrick_core::error::DerrickError;

use crate::dump;
use crate::verify;
use crate::work::{WorkGraph, WorkNodeId};
use crate::HoistResult;

use super::candidates::HoistCandidateSet;

/// Apply every location of every candidate set; returns the number of
/// promotions performed.
///
/// With `check` enabled the whole graph is re-validated after each promotion
/// and the first broken promise aborts with a diagnostic naming the hoist
/// path.
pub(crate) fn apply_candidates(
    graph: &mut WorkGraph,
    root: WorkNodeId,
    candidates: Vec<HoistCandidateSet>,
    ancestor_deps: &mut IndexMap<String, WorkNodeId>,
    check: bool,
) -> HoistResult<usize> {
    let mut promoted = 0usize;
    // one clone tree per pass, keyed by (parent clone, child name)
    let mut clones: HashMap<(WorkNodeId, String), WorkNodeId> = HashMap::new();

    for set in &candidates {
        for location in &set.locations {
            // the finder forbids these shapes; re-check before mutating
            let root_node = graph.node(root);
            if root_node.name == set.name && root_node.ident != set.ident {
                continue;
            }
            if let Some(&existing) = root_node.dependencies.get(&set.name) {
                if graph.node(existing).ident != set.ident {
                    continue;
                }
            }

            // walk the intermediate chain, cloning lazily
            let mut cursor = root;
            let mut path_intact = true;
            for &step in &location.node_path {
                let step_name = graph.node(step).name.clone();
                let clone_id = match clones.get(&(cursor, step_name.clone())) {
                    Some(&clone_id) => clone_id,
                    None => {
                        let Some(&child) = graph.node(cursor).dependencies.get(&step_name) else {
                            path_intact = false;
                            break;
                        };
                        // an earlier promotion may have rewired this level
                        if graph.node(child).locator != graph.node(step).locator {
                            path_intact = false;
                            break;
                        }
                        let clone_id = graph.clone_node(child);
                        graph
                            .node_mut(cursor)
                            .dependencies
                            .insert(step_name.clone(), clone_id);
                        clones.insert((cursor, step_name), clone_id);
                        clone_id
                    }
                };
                graph
                    .node_mut(clone_id)
                    .relayed_dependencies
                    .insert(set.name.clone(), location.node);
                cursor = clone_id;
            }
            if !path_intact {
                continue;
            }

            // detach from the terminal intermediate, leaving the promise that
            // the name now resolves at the root
            let Some(&owned) = graph.node(cursor).dependencies.get(&set.name) else {
                continue;
            };
            if graph.node(owned).ident != set.ident {
                continue;
            }
            let terminal = graph.node_mut(cursor);
            terminal.dependencies.shift_remove(&set.name);
            terminal.hoisted_dependencies.insert(set.name.clone(), owned);
            terminal.reasons.shift_remove(&set.name);

            // land at the root: merge into an existing instance or move in
            match graph.node(root).dependencies.get(&set.name).copied() {
                Some(existing) => {
                    if existing != owned {
                        let references: Vec<String> =
                            graph.node(owned).references.iter().cloned().collect();
                        let target = graph.node_mut(existing);
                        for reference in references {
                            target.references.insert(reference);
                        }
                    }
                }
                None => {
                    graph
                        .node_mut(root)
                        .dependencies
                        .insert(set.name.clone(), owned);
                    ancestor_deps.insert(set.name.clone(), owned);
                }
            }
            promoted += 1;

            if check {
                let log = verify::self_check(graph);
                if !log.is_empty() {
                    let path = hoist_path(graph, root, location.node_path.as_slice(), owned);
                    return Err(DerrickError::LayoutCheckFailed {
                        log: format!("while hoisting via {path}:\n{log}"),
                        dump: dump::dump_graph(graph),
                    });
                }
            }
        }
    }

    Ok(promoted)
}

fn hoist_path(
    graph: &WorkGraph,
    root: WorkNodeId,
    node_path: &[WorkNodeId],
    node: WorkNodeId,
) -> String {
    std::iter::once(root)
        .chain(node_path.iter().copied())
        .chain(std::iter::once(node))
        .map(|id| graph.node(id).locator.pretty())
        .collect::<Vec<_>>()
        .join("→")
}
