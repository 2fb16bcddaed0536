//! Popularity index over the working graph.
//!
//! For every package identity, the set of identities that depend on it
//! through regular edges. The cardinality of an entry is the weight used to
//! settle name collisions between hoist candidates: the most-depended-upon
//! instance of a name wins. Peer edges contribute nothing because a peer's
//! popularity comes from its regular dependents.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

use derrick_core::types::Ident;

use crate::work::{WorkGraph, WorkNodeId};

pub(crate) type AncestorIndex = IndexMap<Ident, IndexSet<Ident>>;

/// Build the dependent index with a single memoized traversal
pub(crate) fn build_ancestor_index(graph: &WorkGraph) -> AncestorIndex {
    let mut index = AncestorIndex::new();
    let mut visited: HashSet<WorkNodeId> = HashSet::new();
    visit(graph, graph.root, &mut index, &mut visited);
    index
}

fn visit(
    graph: &WorkGraph,
    id: WorkNodeId,
    index: &mut AncestorIndex,
    visited: &mut HashSet<WorkNodeId>,
) {
    if !visited.insert(id) {
        return;
    }
    let node = graph.node(id);
    for (name, &child) in &node.dependencies {
        if node.peer_names.contains(name) {
            continue;
        }
        let child_ident = graph.node(child).ident.clone();
        index.entry(child_ident).or_default().insert(node.ident.clone());
        visit(graph, child, index, visited);
    }
}

/// Popularity of an identity; identities never seen through a regular edge
/// weigh nothing
pub(crate) fn weight_of(index: &AncestorIndex, ident: &Ident) -> usize {
    index.get(ident).map(IndexSet::len).unwrap_or(0)
}
