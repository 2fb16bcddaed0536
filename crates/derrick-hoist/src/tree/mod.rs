//! External tree shapes: the caller's dependency graph and the hoisted result.
//!
//! Both graphs are arenas: nodes live in a flat store and refer to each other
//! through index handles, so a cyclic graph is simply a handle that appears
//! more than once. The JSON representation mirrors the arena directly, which
//! keeps cycles expressible on the wire.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Handle to a node in a [`DependencyTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputNodeId(pub u32);

/// Handle to a node in a [`HoistedTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputNodeId(pub u32);

/// A package instance in the input graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputNode {
    /// Package name
    pub name: String,
    /// Opaque version/resolution string; a `<prefix>#<real>` shape marks a
    /// virtual decoration that is ignored for identity comparisons
    pub reference: String,
    /// Child packages this instance resolves
    #[serde(default)]
    pub dependencies: Vec<InputNodeId>,
    /// Names among `dependencies` to treat as peer dependencies
    #[serde(default)]
    pub peer_names: IndexSet<String>,
}

/// Caller-facing dependency graph; may contain cycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyTree {
    /// Handle of the root package (conventionally named `.`)
    pub root: InputNodeId,
    /// Flat node store
    pub packages: Vec<InputNode>,
}

impl DependencyTree {
    /// Create a tree containing only the root package
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            root: InputNodeId(0),
            packages: vec![InputNode {
                name: name.into(),
                reference: reference.into(),
                dependencies: Vec::new(),
                peer_names: IndexSet::new(),
            }],
        }
    }

    /// Add a package instance to the graph and return its handle
    pub fn add_package(
        &mut self,
        name: impl Into<String>,
        reference: impl Into<String>,
    ) -> InputNodeId {
        let id = InputNodeId(self.packages.len() as u32);
        self.packages.push(InputNode {
            name: name.into(),
            reference: reference.into(),
            dependencies: Vec::new(),
            peer_names: IndexSet::new(),
        });
        id
    }

    /// Declare `child` as a regular dependency of `parent`
    pub fn add_dependency(&mut self, parent: InputNodeId, child: InputNodeId) {
        let deps = &mut self.packages[parent.0 as usize].dependencies;
        if !deps.contains(&child) {
            deps.push(child);
        }
    }

    /// Declare `child` as a peer dependency of `parent`.
    ///
    /// The child edge still carries the resolution; the peer marker records
    /// that `parent` expects its own parent to supply the instance.
    pub fn add_peer_dependency(&mut self, parent: InputNodeId, child: InputNodeId) {
        self.add_dependency(parent, child);
        let child_name = self.packages[child.0 as usize].name.clone();
        self.packages[parent.0 as usize].peer_names.insert(child_name);
    }

    /// Get a node by handle
    pub fn node(&self, id: InputNodeId) -> &InputNode {
        &self.packages[id.0 as usize]
    }

    /// Number of package instances in the graph
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

/// A package instance in the hoisted result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputNode {
    /// Package name
    pub name: String,
    /// Every reference merged into this instance during hoisting
    pub references: IndexSet<String>,
    /// Child packages nested under this instance
    pub dependencies: Vec<OutputNodeId>,
}

/// Result graph produced by [`crate::hoist`]; cycles from the input survive
/// as shared handles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoistedTree {
    /// Handle of the root package
    pub root: OutputNodeId,
    /// Flat node store
    pub packages: Vec<OutputNode>,
}

impl HoistedTree {
    /// Get a node by handle
    pub fn node(&self, id: OutputNodeId) -> &OutputNode {
        &self.packages[id.0 as usize]
    }

    /// Get the root node
    pub fn root_node(&self) -> &OutputNode {
        self.node(self.root)
    }

    /// Find the child of `parent` with the given package name
    pub fn child_by_name(&self, parent: OutputNodeId, name: &str) -> Option<OutputNodeId> {
        self.node(parent)
            .dependencies
            .iter()
            .copied()
            .find(|&child| self.node(child).name == name)
    }

    /// Number of package instances reachable from the root
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Cycle-aware structural comparison.
    ///
    /// Two trees are structurally equal when their roots carry the same name
    /// and reference set and their children, matched by name, are recursively
    /// structurally equal. Handle values are irrelevant.
    pub fn structurally_equal(&self, other: &HoistedTree) -> bool {
        let mut seen: HashSet<(u32, u32)> = HashSet::new();
        self.nodes_equal(other, self.root, other.root, &mut seen)
    }

    fn nodes_equal(
        &self,
        other: &HoistedTree,
        a: OutputNodeId,
        b: OutputNodeId,
        seen: &mut HashSet<(u32, u32)>,
    ) -> bool {
        if !seen.insert((a.0, b.0)) {
            return true;
        }
        let an = self.node(a);
        let bn = other.node(b);
        if an.name != bn.name
            || an.references.len() != bn.references.len()
            || !an.references.iter().all(|r| bn.references.contains(r))
            || an.dependencies.len() != bn.dependencies.len()
        {
            return false;
        }
        let mut a_children = an.dependencies.clone();
        let mut b_children = bn.dependencies.clone();
        a_children.sort_by(|x, y| self.node(*x).name.cmp(&self.node(*y).name));
        b_children.sort_by(|x, y| other.node(*x).name.cmp(&other.node(*y).name));
        a_children
            .iter()
            .zip(b_children.iter())
            .all(|(&ca, &cb)| self.nodes_equal(other, ca, cb, seen))
    }

    /// Render the tree with the same connectors as the diagnostic dump
    pub fn to_text_tree(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.label(self.root));
        out.push('\n');
        let mut stack = vec![self.root];
        self.render(self.root, "", &mut stack, &mut out);
        out
    }

    fn label(&self, id: OutputNodeId) -> String {
        let node = self.node(id);
        let mut references: Vec<&str> = node.references.iter().map(String::as_str).collect();
        references.sort_unstable();
        if let [reference] = references[..] {
            derrick_core::Locator::new(node.name.clone(), reference).pretty()
        } else {
            format!("{}@[{}]", node.name, references.join(", "))
        }
    }

    fn render(&self, id: OutputNodeId, prefix: &str, stack: &mut Vec<OutputNodeId>, out: &mut String) {
        let node = self.node(id);
        for (idx, &child) in node.dependencies.iter().enumerate() {
            let last = idx == node.dependencies.len() - 1;
            let back_edge = stack.contains(&child);
            out.push_str(prefix);
            out.push_str(if last { "└─" } else { "├─" });
            if back_edge {
                out.push('>');
            }
            out.push_str(&self.label(child));
            out.push('\n');
            if !back_edge {
                let child_prefix = format!("{}{}", prefix, if last { "  " } else { "│ " });
                stack.push(child);
                self.render(child, &child_prefix, stack, out);
                stack.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let mut tree = DependencyTree::new(".", "workspace:.");
        let a = tree.add_package("A", "1.0.0");
        let b = tree.add_package("B", "1.0.0");
        tree.add_dependency(tree.root, a);
        tree.add_dependency(a, b);

        assert_eq!(tree.package_count(), 3);
        assert_eq!(tree.node(tree.root).dependencies, vec![a]);
        assert_eq!(tree.node(a).dependencies, vec![b]);
        assert!(tree.node(a).peer_names.is_empty());
    }

    #[test]
    fn test_peer_dependency_marks_name() {
        let mut tree = DependencyTree::new(".", "workspace:.");
        let x = tree.add_package("X", "1.0.0");
        let p = tree.add_package("P", "1.0.0");
        tree.add_dependency(tree.root, x);
        tree.add_peer_dependency(x, p);

        assert!(tree.node(x).peer_names.contains("P"));
        assert_eq!(tree.node(x).dependencies, vec![p]);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut tree = DependencyTree::new(".", "workspace:.");
        let a = tree.add_package("A", "1.0.0");
        tree.add_dependency(tree.root, a);
        tree.add_dependency(tree.root, a);

        assert_eq!(tree.node(tree.root).dependencies.len(), 1);
    }

    #[test]
    fn test_serde_roundtrip_with_cycle() {
        let mut tree = DependencyTree::new(".", "workspace:.");
        let a = tree.add_package("A", "1.0.0");
        let b = tree.add_package("B", "1.0.0");
        tree.add_dependency(tree.root, a);
        tree.add_dependency(a, b);
        tree.add_dependency(b, a); // cycle

        let json = serde_json::to_string(&tree).unwrap();
        let parsed: DependencyTree = serde_json::from_str(&json).unwrap();
        assert_eq!(tree, parsed);
        assert!(json.contains("peerNames"));
    }

    #[test]
    fn test_child_by_name() {
        let tree = HoistedTree {
            root: OutputNodeId(0),
            packages: vec![
                OutputNode {
                    name: ".".to_string(),
                    references: IndexSet::from(["workspace:.".to_string()]),
                    dependencies: vec![OutputNodeId(1)],
                },
                OutputNode {
                    name: "A".to_string(),
                    references: IndexSet::from(["1.0.0".to_string()]),
                    dependencies: vec![],
                },
            ],
        };
        assert_eq!(tree.child_by_name(tree.root, "A"), Some(OutputNodeId(1)));
        assert_eq!(tree.child_by_name(tree.root, "B"), None);
    }

    #[test]
    fn test_structural_equality_ignores_handles() {
        let left = HoistedTree {
            root: OutputNodeId(0),
            packages: vec![
                OutputNode {
                    name: ".".to_string(),
                    references: IndexSet::from(["workspace:.".to_string()]),
                    dependencies: vec![OutputNodeId(1), OutputNodeId(2)],
                },
                OutputNode {
                    name: "A".to_string(),
                    references: IndexSet::from(["1.0.0".to_string()]),
                    dependencies: vec![],
                },
                OutputNode {
                    name: "B".to_string(),
                    references: IndexSet::from(["1.0.0".to_string()]),
                    dependencies: vec![],
                },
            ],
        };
        let right = HoistedTree {
            root: OutputNodeId(2),
            packages: vec![
                OutputNode {
                    name: "B".to_string(),
                    references: IndexSet::from(["1.0.0".to_string()]),
                    dependencies: vec![],
                },
                OutputNode {
                    name: "A".to_string(),
                    references: IndexSet::from(["1.0.0".to_string()]),
                    dependencies: vec![],
                },
                OutputNode {
                    name: ".".to_string(),
                    references: IndexSet::from(["workspace:.".to_string()]),
                    dependencies: vec![OutputNodeId(0), OutputNodeId(1)],
                },
            ],
        };
        assert!(left.structurally_equal(&right));

        let mut different = left.clone();
        different.packages[1].references = IndexSet::from(["2.0.0".to_string()]);
        assert!(!left.structurally_equal(&different));
    }

    #[test]
    fn test_text_tree_rendering() {
        let tree = HoistedTree {
            root: OutputNodeId(0),
            packages: vec![
                OutputNode {
                    name: ".".to_string(),
                    references: IndexSet::from(["workspace:.".to_string()]),
                    dependencies: vec![OutputNodeId(1), OutputNodeId(2)],
                },
                OutputNode {
                    name: "A".to_string(),
                    references: IndexSet::from(["npm:1.0.0".to_string()]),
                    dependencies: vec![],
                },
                OutputNode {
                    name: "B".to_string(),
                    references: IndexSet::from(["1.0.0".to_string()]),
                    dependencies: vec![],
                },
            ],
        };
        let rendered = tree.to_text_tree();
        assert_eq!(rendered, ".\n├─A@1.0.0\n└─B@1.0.0\n");
    }
}
