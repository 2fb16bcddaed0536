//! Candidate discovery for one hoist root.
//!
//! A depth-first walk over the root's subtree collects, per package name, the
//! set of locations whose node may legally become a direct child of the root.
//! A node qualifies only when every promotability rule holds:
//!
//! 1. its name is not a peer of the root,
//! 2. it does not collide with the root's own identity,
//! 3. no node between it and the root (the root included) pins its name to a
//!    different identity, neither in its visible children nor in its relayed
//!    record,
//! 4. no more popular instance of the name has been found already,
//! 5. the resolutions promised to it by earlier promotions stay intact at the
//!    root,
//! 6. its peer dependencies are supplied at or above the root: no node on the
//!    way up supplies them lower, and the root's own resolution map carries
//!    them with the promised identity.
//!
//! Rule failures record a human-readable reason on the node's parent when the
//! debug level asks for it.

use indexmap::{map::Entry, IndexMap, IndexSet};

use derrick_core::types::{Ident, Locator};

use crate::work::{Reason, WorkGraph, WorkNodeId};

use super::ancestry::{weight_of, AncestorIndex};

/// One promotable position: the chain of intermediates below the root
/// (deepest last; the last entry currently owns the node)
#[derive(Debug, Clone)]
pub(crate) struct CandidateLocation {
    pub node_path: Vec<WorkNodeId>,
    pub node: WorkNodeId,
}

/// Every promotable instance found for one package name
#[derive(Debug)]
pub(crate) struct HoistCandidateSet {
    pub name: String,
    pub ident: Ident,
    pub weight: usize,
    pub locations: Vec<CandidateLocation>,
}

/// Rejection note destined for a parent's `reasons` map
pub(crate) type Rejection = (WorkNodeId, String, Reason);

pub(crate) struct FinderInput<'a> {
    pub graph: &'a WorkGraph,
    pub ancestor_index: &'a AncestorIndex,
    pub root: WorkNodeId,
    /// Locators of every root on the path from the graph root down to (and
    /// including) the current root
    pub root_path_locators: &'a IndexSet<Locator>,
    /// What every name resolves to at the root position
    pub ancestor_deps: &'a IndexMap<String, WorkNodeId>,
    pub record_reasons: bool,
}

/// Search the root's subtree for promotable nodes
pub(crate) fn find_candidates(
    input: &FinderInput<'_>,
) -> (Vec<HoistCandidateSet>, Vec<Rejection>) {
    let mut candidates: IndexMap<String, HoistCandidateSet> = IndexMap::new();
    let mut rejections: Vec<Rejection> = Vec::new();
    let mut seen: IndexSet<Locator> = IndexSet::new();
    let mut stack: Vec<WorkNodeId> = Vec::new();

    let root_node = input.graph.node(input.root);
    for (name, &child) in &root_node.dependencies {
        if root_node.peer_names.contains(name) {
            continue;
        }
        let child_locator = &input.graph.node(child).locator;
        if input.root_path_locators.contains(child_locator) {
            continue;
        }
        if seen.insert(child_locator.clone()) {
            stack.push(child);
            descend(input, child, &mut stack, &mut seen, &mut candidates, &mut rejections);
            stack.pop();
        }
    }

    (candidates.into_values().collect(), rejections)
}

fn descend(
    input: &FinderInput<'_>,
    parent: WorkNodeId,
    stack: &mut Vec<WorkNodeId>,
    seen: &mut IndexSet<Locator>,
    candidates: &mut IndexMap<String, HoistCandidateSet>,
    rejections: &mut Vec<Rejection>,
) {
    let parent_node = input.graph.node(parent);
    for (name, &dep) in &parent_node.dependencies {
        if parent_node.peer_names.contains(name) {
            continue;
        }
        if stack.contains(&dep) {
            continue;
        }
        let dep_locator = &input.graph.node(dep).locator;
        if input.root_path_locators.contains(dep_locator) {
            continue;
        }
        evaluate(input, parent, dep, stack, candidates, rejections);
        if seen.insert(dep_locator.clone()) {
            stack.push(dep);
            descend(input, dep, stack, seen, candidates, rejections);
            stack.pop();
        }
    }
}

/// Run the promotability rules for the node at one location and record it on
/// success
fn evaluate(
    input: &FinderInput<'_>,
    parent: WorkNodeId,
    node_id: WorkNodeId,
    stack: &[WorkNodeId],
    candidates: &mut IndexMap<String, HoistCandidateSet>,
    rejections: &mut Vec<Rejection>,
) {
    let graph = input.graph;
    let node = graph.node(node_id);
    let root_node = graph.node(input.root);

    let reject = |message: String, rejections: &mut Vec<Rejection>| {
        if input.record_reasons {
            rejections.push((
                parent,
                node.name.clone(),
                Reason {
                    root: root_node.locator.clone(),
                    message,
                },
            ));
        }
    };

    // rule 1: peers of the root stay where they are
    if root_node.peer_names.contains(&node.name) {
        return;
    }

    // rule 2: the root itself owns this name
    if root_node.name == node.name && root_node.ident != node.ident {
        reject(
            format!("conflicts with the root {}", root_node.locator.pretty()),
            rejections,
        );
        return;
    }

    // rule 3: the name must be free at the root and along the way up
    if let Some(&declared) = root_node.original_dependencies.get(&node.name) {
        let declared = graph.node(declared);
        if declared.ident != node.ident {
            reject(
                format!(
                    "the root resolves {} for this name",
                    declared.locator.pretty()
                ),
                rejections,
            );
            return;
        }
    }
    for &ancestor_id in std::iter::once(&input.root).chain(stack.iter()) {
        let ancestor = graph.node(ancestor_id);
        let held = [
            ancestor.dependencies.get(&node.name),
            ancestor.relayed_dependencies.get(&node.name),
        ];
        for &held_id in held.into_iter().flatten() {
            if graph.node(held_id).ident != node.ident {
                reject(
                    format!(
                        "{} is pinned at {}",
                        graph.node(held_id).locator.pretty(),
                        ancestor.locator.pretty()
                    ),
                    rejections,
                );
                return;
            }
        }
    }

    // rule 4: a more popular instance of this name wins
    let weight = weight_of(input.ancestor_index, &node.ident);
    if let Some(existing) = candidates.get(&node.name) {
        if weight < existing.weight {
            reject(
                format!("{} has more dependents", existing.ident),
                rejections,
            );
            return;
        }
    }

    // rule 5: promises made by earlier promotions must survive at the root
    let merges_at_root = root_node
        .dependencies
        .get(&node.name)
        .map(|&dep| graph.node(dep).ident == node.ident)
        .unwrap_or(false);
    if !merges_at_root {
        for (dep_name, &promised_id) in &node.hoisted_dependencies {
            if !node.original_dependencies.contains_key(dep_name) {
                continue;
            }
            let promised = graph.node(promised_id);
            match input.ancestor_deps.get(dep_name) {
                Some(&available) if graph.node(available).ident == promised.ident => {}
                Some(&available) => {
                    reject(
                        format!(
                            "hoisted dependency {} resolves to {} at the root",
                            promised.locator.pretty(),
                            graph.node(available).locator.pretty()
                        ),
                        rejections,
                    );
                    return;
                }
                None => {
                    reject(
                        format!(
                            "hoisted dependency {} is not visible at the root",
                            promised.locator.pretty()
                        ),
                        rejections,
                    );
                    return;
                }
            }
        }
    }

    // rule 6: peer dependencies must be supplied at or above the root
    let required: Vec<&str> = node.peer_names.iter().map(String::as_str).collect();
    if !required.is_empty() {
        // nothing between the node and the root may supply a peer name lower
        for &ancestor_id in stack.iter().rev() {
            let ancestor = graph.node(ancestor_id);
            for &peer_name in &required {
                if ancestor.peer_names.contains(peer_name) {
                    // the ancestor passes the requirement further up
                    continue;
                }
                if let Some(&provider) = ancestor.dependencies.get(peer_name) {
                    reject(
                        format!(
                            "peer dependency {} is supplied by {}",
                            graph.node(provider).locator.pretty(),
                            ancestor.locator.pretty()
                        ),
                        rejections,
                    );
                    return;
                }
            }
        }
        // and the root's resolution map must actually carry every peer with
        // the identity the node was given
        for &peer_name in &required {
            let promised = node
                .original_dependencies
                .get(peer_name)
                .map(|&dep| &graph.node(dep).ident);
            match input.ancestor_deps.get(peer_name) {
                Some(&available)
                    if promised.map_or(true, |p| graph.node(available).ident == *p) => {}
                Some(&available) => {
                    reject(
                        format!(
                            "peer dependency {} resolves to {} at the root",
                            peer_name,
                            graph.node(available).locator.pretty()
                        ),
                        rejections,
                    );
                    return;
                }
                None => {
                    reject(
                        format!("peer dependency {peer_name} is not supplied at the root"),
                        rejections,
                    );
                    return;
                }
            }
        }
    }

    // all rules hold: record this location
    let location = CandidateLocation {
        node_path: stack.to_vec(),
        node: node_id,
    };
    match candidates.entry(node.name.clone()) {
        Entry::Occupied(mut occupied) => {
            let set = occupied.get_mut();
            if set.ident == node.ident {
                set.locations.push(location);
            } else if weight > set.weight {
                // a strictly more popular identity takes the name over and
                // drops the locations recorded for the old one
                *set = HoistCandidateSet {
                    name: node.name.clone(),
                    ident: node.ident.clone(),
                    weight,
                    locations: vec![location],
                };
            }
        }
        Entry::Vacant(vacant) => {
            vacant.insert(HoistCandidateSet {
                name: node.name.clone(),
                ident: node.ident.clone(),
                weight,
                locations: vec![location],
            });
        }
    }
}
