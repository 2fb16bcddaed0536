//! Internal mutable working graph.
//!
//! `WorkNode`s are arena-allocated and addressed by `WorkNodeId` handles;
//! back-edges reuse handles, which is how input cycles survive cloning. All
//! per-node maps are insertion-ordered: the diagnostic dump and the
//! popularity tie-break both observe iteration order.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

use derrick_core::types::{Ident, Locator};

use crate::tree::{DependencyTree, InputNodeId};

/// Handle to a node in a [`WorkGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct WorkNodeId(pub u32);

/// Rejection diagnostic attached to the parent of a non-promotable node
#[derive(Debug, Clone)]
pub(crate) struct Reason {
    /// Root that rejected the promotion
    pub root: Locator,
    /// Human-readable explanation
    pub message: String,
}

/// A package instance in the working graph
#[derive(Debug, Clone)]
pub(crate) struct WorkNode {
    pub name: String,
    pub ident: Ident,
    pub locator: Locator,
    /// Every reference merged into this instance so far
    pub references: IndexSet<String>,
    /// Children currently visible at this node
    pub dependencies: IndexMap<String, WorkNodeId>,
    /// Children the input declared; never mutated after cloning
    pub original_dependencies: IndexMap<String, WorkNodeId>,
    /// Dependencies promoted away from this node: the promise that the name
    /// now resolves at an ancestor with this identity
    pub hoisted_dependencies: IndexMap<String, WorkNodeId>,
    /// Dependencies promoted *through* this node while it sat on a promotion
    /// path; blocks later promotions of a conflicting identity
    pub relayed_dependencies: IndexMap<String, WorkNodeId>,
    /// Names among `original_dependencies` that are peer dependencies
    pub peer_names: IndexSet<String>,
    /// Why children of this node were refused promotion, per name
    pub reasons: IndexMap<String, Reason>,
}

impl WorkNode {
    fn new(name: &str, reference: &str, peer_names: IndexSet<String>) -> Self {
        let locator = Locator::new(name, reference);
        let ident = locator.ident();
        let mut references = IndexSet::new();
        references.insert(reference.to_string());
        Self {
            name: name.to_string(),
            ident,
            locator,
            references,
            dependencies: IndexMap::new(),
            original_dependencies: IndexMap::new(),
            hoisted_dependencies: IndexMap::new(),
            relayed_dependencies: IndexMap::new(),
            peer_names,
            reasons: IndexMap::new(),
        }
    }
}

/// Mutable graph the engine owns for the duration of one hoist call
#[derive(Debug)]
pub(crate) struct WorkGraph {
    nodes: Vec<WorkNode>,
    pub root: WorkNodeId,
}

impl WorkGraph {
    /// Convert the caller's graph into a working graph, preserving cycles
    /// through an identity memo. Self-references are absorbed the same way:
    /// the memo hands back the node under construction.
    pub fn from_input(tree: &DependencyTree) -> Self {
        let mut graph = Self {
            nodes: Vec::with_capacity(tree.package_count()),
            root: WorkNodeId(0),
        };
        let mut memo: HashMap<InputNodeId, WorkNodeId> = HashMap::new();
        graph.root = graph.clone_input_node(tree, tree.root, &mut memo);
        graph
    }

    fn clone_input_node(
        &mut self,
        tree: &DependencyTree,
        id: InputNodeId,
        memo: &mut HashMap<InputNodeId, WorkNodeId>,
    ) -> WorkNodeId {
        if let Some(&work_id) = memo.get(&id) {
            return work_id;
        }
        let input = tree.node(id);
        let work_id = self.alloc(WorkNode::new(
            &input.name,
            &input.reference,
            input.peer_names.clone(),
        ));
        memo.insert(id, work_id);
        for &child in &tree.node(id).dependencies {
            let child_id = self.clone_input_node(tree, child, memo);
            let child_name = self.node(child_id).name.clone();
            let node = self.node_mut(work_id);
            node.dependencies.insert(child_name.clone(), child_id);
            node.original_dependencies.insert(child_name, child_id);
        }
        work_id
    }

    /// Shallow copy used by the applier's clone tree. A self-reference in the
    /// source's visible children is repointed at the copy.
    pub fn clone_node(&mut self, id: WorkNodeId) -> WorkNodeId {
        let mut copy = self.node(id).clone();
        let copy_id = WorkNodeId(self.nodes.len() as u32);
        if let Some(self_dep) = copy.dependencies.get_mut(&copy.name) {
            if *self_dep == id {
                *self_dep = copy_id;
            }
        }
        self.nodes.push(copy);
        copy_id
    }

    pub fn node(&self, id: WorkNodeId) -> &WorkNode {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: WorkNodeId) -> &mut WorkNode {
        &mut self.nodes[id.0 as usize]
    }

    fn alloc(&mut self, node: WorkNode) -> WorkNodeId {
        let id = WorkNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}
