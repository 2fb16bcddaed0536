//! Diagnostic rendering of the working graph.
//!
//! Tree-shaped text using `├─`/`└─` connectors. An edge back to a node on the
//! current walk is prefixed with `>` and not descended into. Rejection
//! reasons recorded during candidate search are appended to the child line
//! that carries them.

use crate::work::{WorkGraph, WorkNodeId};

const MAX_DUMP_NODES: usize = 50_000;

pub(crate) fn dump_graph(graph: &WorkGraph) -> String {
    let mut out = String::new();
    out.push_str(&graph.node(graph.root).locator.pretty());
    out.push('\n');
    let mut stack = vec![graph.root];
    let mut emitted = 0usize;
    render(graph, graph.root, "", &mut stack, &mut emitted, &mut out);
    if emitted > MAX_DUMP_NODES {
        out.push_str("... dump truncated at 50000 nodes\n");
    }
    out
}

fn render(
    graph: &WorkGraph,
    id: WorkNodeId,
    prefix: &str,
    stack: &mut Vec<WorkNodeId>,
    emitted: &mut usize,
    out: &mut String,
) {
    let node = graph.node(id);
    for (idx, (name, &child)) in node.dependencies.iter().enumerate() {
        *emitted += 1;
        if *emitted > MAX_DUMP_NODES {
            return;
        }
        let last = idx == node.dependencies.len() - 1;
        let back_edge = stack.contains(&child);
        out.push_str(prefix);
        out.push_str(if last { "└─" } else { "├─" });
        if back_edge {
            out.push('>');
        }
        out.push_str(&graph.node(child).locator.pretty());
        if let Some(reason) = node.reasons.get(name) {
            out.push_str(&format!(" ({})", reason.message));
        }
        out.push('\n');
        if !back_edge {
            let child_prefix = format!("{}{}", prefix, if last { "  " } else { "│ " });
            stack.push(child);
            render(graph, child, &child_prefix, stack, emitted, out);
            stack.pop();
        }
    }
}
