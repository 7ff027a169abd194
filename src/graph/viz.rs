use serde::Serialize;

use crate::core::edge::EdgeKind;
use crate::core::node::{NodeId, Role};
use crate::graph::detect::Detection;
use crate::graph::store::Snapshot;

const PROCESS_COLUMN: f32 = 0.0;
const RESOURCE_COLUMN: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub node: NodeId,
    pub x: f32,
    pub y: f32,
}

/// Processes in one column, resources in another, each ordered top-down by
/// creation index.
pub fn layout(snapshot: &Snapshot) -> Vec<Position> {
    let mut out = Vec::new();
    for (idx, node) in snapshot.processes().enumerate() {
        out.push(Position {
            node: *node,
            x: PROCESS_COLUMN,
            y: row(idx),
        });
    }
    for (idx, node) in snapshot.resources().enumerate() {
        out.push(Position {
            node: *node,
            x: RESOURCE_COLUMN,
            y: row(idx),
        });
    }
    out
}

// Row 0 stays `0.0`; negating it would print as `-0`.
fn row(idx: usize) -> f32 {
    if idx == 0 {
        0.0
    } else {
        -(idx as f32)
    }
}

pub fn render_text(snapshot: &Snapshot, detection: &Detection) -> String {
    let processes: Vec<String> = snapshot.processes().map(NodeId::to_string).collect();
    let resources: Vec<String> = snapshot.resources().map(NodeId::to_string).collect();
    let mut out = String::new();

    out.push_str(&format!("Processes: {}\n", join_or_none(&processes)));
    out.push_str(&format!("Resources: {}\n", join_or_none(&resources)));
    if snapshot.edges.is_empty() {
        out.push_str("Edges: (none)\n");
    } else {
        out.push_str("Edges:\n");
        for edge in &snapshot.edges {
            out.push_str(&format!(
                "  {} {} {}  ({})\n",
                edge.from,
                arrow(edge.kind),
                edge.to,
                edge.kind
            ));
        }
    }
    out.push_str(&detection.status_line());
    out.push('\n');
    out
}

pub fn render_dot(snapshot: &Snapshot, detection: &Detection) -> String {
    let on_cycle: Vec<NodeId> = detection
        .cycle()
        .map(|cycle| cycle.nodes())
        .unwrap_or_default();
    let mut out = String::from("digraph rag {\n  rankdir=LR;\n");
    for position in layout(snapshot) {
        let role = position.node.role();
        let border = if on_cycle.contains(&position.node) {
            "red"
        } else {
            "black"
        };
        out.push_str(&format!(
            "  \"{}\" [shape={}, style=filled, fillcolor=\"{}\", color={}, pos=\"{},{}!\"];\n",
            position.node,
            role.shape(),
            role.color(),
            border,
            position.x,
            position.y
        ));
    }
    for edge in &snapshot.edges {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [color={}, style={}];\n",
            edge.from,
            edge.to,
            edge.kind.color(),
            edge.kind.style()
        ));
    }
    out.push_str("}\n");
    out
}

fn arrow(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Allocation => "──▶",
        EdgeKind::Request => "╌╌▶",
    }
}

fn join_or_none(ids: &[String]) -> String {
    if ids.is_empty() {
        "(none)".to_string()
    } else {
        ids.join(", ")
    }
}

pub fn legend() -> String {
    format!(
        "{} Allocation ({} {})\n{} Request ({} {})\n{} {}  {} {}\n",
        arrow(EdgeKind::Allocation),
        EdgeKind::Allocation.style(),
        EdgeKind::Allocation.color(),
        arrow(EdgeKind::Request),
        EdgeKind::Request.style(),
        EdgeKind::Request.color(),
        Role::Process.label(),
        Role::Process.shape(),
        Role::Resource.label(),
        Role::Resource.shape()
    )
}
