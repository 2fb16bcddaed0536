//! Layout self-check.
//!
//! Walks the working graph carrying the map of visible resolutions (the
//! parent's map overlaid with the node's own non-peer children) and verifies
//! every promise the input made:
//!
//! - a regular dependency must still resolve to its original identity,
//! - a peer dependency must resolve to whatever the parent resolves.
//!
//! Returns a multi-line report, empty when the layout is intact.

use indexmap::IndexMap;

use crate::work::{WorkGraph, WorkNodeId};

pub(crate) fn self_check(graph: &WorkGraph) -> String {
    let mut log: Vec<String> = Vec::new();
    let mut stack: Vec<WorkNodeId> = Vec::new();
    check_node(graph, graph.root, &IndexMap::new(), &mut stack, &mut log);
    log.join("\n")
}

fn check_node(
    graph: &WorkGraph,
    id: WorkNodeId,
    parent_deps: &IndexMap<String, WorkNodeId>,
    stack: &mut Vec<WorkNodeId>,
    log: &mut Vec<String>,
) {
    if stack.contains(&id) {
        return;
    }
    let node = graph.node(id);

    let mut visible = parent_deps.clone();
    for (name, &dep) in &node.dependencies {
        if !node.peer_names.contains(name) {
            visible.insert(name.clone(), dep);
        }
    }

    for (name, &original) in &node.original_dependencies {
        let promised = &graph.node(original).ident;
        if node.peer_names.contains(name) {
            let found = parent_deps.get(name).copied();
            if found.map(|dep| &graph.node(dep).ident) != Some(promised) {
                log.push(format!(
                    "{} - broken peer promise for {}: expected {}, found {}",
                    tree_path(graph, stack, id),
                    name,
                    promised,
                    describe(graph, found),
                ));
            }
        } else {
            let found = visible.get(name).copied();
            if found.map(|dep| &graph.node(dep).ident) != Some(promised) {
                log.push(format!(
                    "{} - broken require promise for {}: expected {}, found {}",
                    tree_path(graph, stack, id),
                    name,
                    promised,
                    describe(graph, found),
                ));
            }
        }
    }

    stack.push(id);
    for (name, &dep) in &node.dependencies {
        if !node.peer_names.contains(name) {
            check_node(graph, dep, &visible, stack, log);
        }
    }
    stack.pop();
}

fn describe(graph: &WorkGraph, found: Option<WorkNodeId>) -> String {
    match found {
        Some(dep) => graph.node(dep).ident.to_string(),
        None => "none".to_string(),
    }
}

fn tree_path(graph: &WorkGraph, stack: &[WorkNodeId], id: WorkNodeId) -> String {
    stack
        .iter()
        .chain(std::iter::once(&id))
        .map(|&node| graph.node(node).locator.pretty())
        .collect::<Vec<_>>()
        .join("→")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::DependencyTree;

    #[test]
    fn test_intact_layout_reports_nothing() {
        let mut tree = DependencyTree::new(".", "workspace:.");
        let a = tree.add_package("A", "1.0.0");
        let b = tree.add_package("B", "1.0.0");
        tree.add_dependency(tree.root, a);
        tree.add_dependency(a, b);

        let graph = WorkGraph::from_input(&tree);
        assert_eq!(self_check(&graph), "");
    }

    #[test]
    fn test_broken_require_promise_is_reported() {
        let mut tree = DependencyTree::new(".", "workspace:.");
        let a = tree.add_package("A", "1.0.0");
        let b = tree.add_package("B", "1.0.0");
        tree.add_dependency(tree.root, a);
        tree.add_dependency(a, b);

        let mut graph = WorkGraph::from_input(&tree);
        // sever B's visibility without recording a promise anywhere
        let &work_a = graph.node(graph.root).dependencies.get("A").unwrap();
        graph.node_mut(work_a).dependencies.shift_remove("B");

        let log = self_check(&graph);
        assert!(log.contains("broken require promise for B"));
        assert!(log.contains("expected B@1.0.0, found none"));
    }

    #[test]
    fn test_peer_promise_checked_against_parent_view() {
        let mut tree = DependencyTree::new(".", "workspace:.");
        let p = tree.add_package("P", "1.0.0");
        let x = tree.add_package("X", "1.0.0");
        tree.add_dependency(tree.root, p);
        tree.add_dependency(tree.root, x);
        tree.add_peer_dependency(x, p);

        let graph = WorkGraph::from_input(&tree);
        assert_eq!(self_check(&graph), "");
    }

    #[test]
    fn test_unsupplied_peer_is_reported() {
        let mut tree = DependencyTree::new(".", "workspace:.");
        let x = tree.add_package("X", "1.0.0");
        let p = tree.add_package("P", "1.0.0");
        tree.add_dependency(tree.root, x);
        tree.add_peer_dependency(x, p);

        let graph = WorkGraph::from_input(&tree);
        let log = self_check(&graph);
        assert!(log.contains("broken peer promise for P"));
    }

    #[test]
    fn test_cycle_terminates() {
        let mut tree = DependencyTree::new(".", "workspace:.");
        let a = tree.add_package("A", "1.0.0");
        let b = tree.add_package("B", "1.0.0");
        tree.add_dependency(tree.root, a);
        tree.add_dependency(a, b);
        tree.add_dependency(b, a);

        let graph = WorkGraph::from_input(&tree);
        assert_eq!(self_check(&graph), "");
    }
}
