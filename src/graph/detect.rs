use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::edge::EdgeKind;
use crate::core::node::NodeId;
use crate::graph::store::ResourceGraph;

/// One hop of a cycle: `node` and the kind of the edge leaving it towards the
/// next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStep {
    pub node: NodeId,
    pub edge: EdgeKind,
}

/// A closed walk. The last step's edge leads back to the first node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    steps: Vec<CycleStep>,
}

impl Cycle {
    pub fn steps(&self) -> &[CycleStep] {
        &self.steps
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.steps.iter().map(|step| step.node).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `P1 → R1 → P1`: every node in order, then the start again.
    pub fn path(&self) -> String {
        let mut parts: Vec<String> = self.steps.iter().map(|step| step.node.to_string()).collect();
        if let Some(first) = self.steps.first() {
            parts.push(first.node.to_string());
        }
        parts.join(" → ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    NoCycle,
    CycleFound(Cycle),
}

impl Detection {
    pub fn is_deadlocked(&self) -> bool {
        matches!(self, Detection::CycleFound(_))
    }

    pub fn cycle(&self) -> Option<&Cycle> {
        match self {
            Detection::CycleFound(cycle) => Some(cycle),
            Detection::NoCycle => None,
        }
    }

    pub fn status_line(&self) -> String {
        match self {
            Detection::CycleFound(cycle) => format!("⚠️ DEADLOCK DETECTED! Cycle: {}", cycle.path()),
            Detection::NoCycle => "✅ System is deadlock-free".to_string(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Finds a directed cycle through any mix of allocation and request edges.
///
/// Roots are tried in node insertion order and successors in edge insertion
/// order, so an unchanged graph always yields the same cycle. The walk keeps
/// its own frame stack, so path length is bounded by memory, not call depth.
pub fn find_cycle(graph: &ResourceGraph) -> Detection {
    let mut state: HashMap<NodeId, VisitState> = HashMap::new();

    for node in graph.nodes() {
        if state.contains_key(&node) {
            continue;
        }
        if let Some(cycle) = visit_from(node, graph, &mut state) {
            return Detection::CycleFound(cycle);
        }
    }

    Detection::NoCycle
}

struct Frame {
    node: NodeId,
    successors: Vec<(NodeId, EdgeKind)>,
    next: usize,
}

impl Frame {
    fn enter(
        node: NodeId,
        graph: &ResourceGraph,
        state: &mut HashMap<NodeId, VisitState>,
    ) -> Self {
        state.insert(node, VisitState::Visiting);
        Self {
            node,
            successors: graph.successors(&node),
            next: 0,
        }
    }
}

fn visit_from(
    root: NodeId,
    graph: &ResourceGraph,
    state: &mut HashMap<NodeId, VisitState>,
) -> Option<Cycle> {
    // `path[i]` is the edge taken out of `stack[i]`.
    let mut path: Vec<CycleStep> = Vec::new();
    let mut stack = vec![Frame::enter(root, graph, state)];

    while let Some(frame) = stack.last_mut() {
        let Some(&(next, edge)) = frame.successors.get(frame.next) else {
            state.insert(frame.node, VisitState::Visited);
            stack.pop();
            path.pop();
            continue;
        };
        frame.next += 1;
        let node = frame.node;

        match state.get(&next).copied() {
            Some(VisitState::Visited) => {}
            Some(VisitState::Visiting) => {
                path.push(CycleStep { node, edge });
                let pos = path.iter().position(|step| step.node == next)?;
                return Some(Cycle {
                    steps: path[pos..].to_vec(),
                });
            }
            None => {
                path.push(CycleStep { node, edge });
                stack.push(Frame::enter(next, graph, state));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use crate::core::edge::EdgeKind;
    use crate::core::node::NodeId;
    use crate::graph::detect::{find_cycle, CycleStep, Detection};
    use crate::graph::store::ResourceGraph;

    fn assert_closed_walk(graph: &ResourceGraph, detection: &Detection) {
        let cycle = detection.cycle().expect("cycle present");
        let steps = cycle.steps();
        for (idx, step) in steps.iter().enumerate() {
            let next = steps[(idx + 1) % steps.len()].node;
            assert!(
                graph.successors(&step.node).contains(&(next, step.edge)),
                "{} has no {} edge to {}",
                step.node,
                step.edge,
                next
            );
        }
    }

    #[test]
    fn empty_graph_has_no_cycle() {
        let graph = ResourceGraph::new();
        assert_eq!(find_cycle(&graph), Detection::NoCycle);
    }

    #[test]
    fn nodes_without_edges_have_no_cycle() {
        let mut graph = ResourceGraph::new();
        for _ in 0..3 {
            graph.add_process();
            graph.add_resource();
        }
        assert_eq!(find_cycle(&graph), Detection::NoCycle);
    }

    #[test]
    fn allocation_and_request_between_pair_deadlocks() {
        let mut graph = ResourceGraph::new();
        let p1 = graph.add_process();
        let r1 = graph.add_resource();
        graph.allocate(r1, p1).expect("allocate");
        graph.request(p1, r1).expect("request");

        let detection = find_cycle(&graph);
        assert!(detection.is_deadlocked());
        let cycle = detection.cycle().expect("cycle");
        assert_eq!(
            cycle.steps(),
            &[
                CycleStep {
                    node: p1,
                    edge: EdgeKind::Request
                },
                CycleStep {
                    node: r1,
                    edge: EdgeKind::Allocation
                },
            ]
        );
        assert_eq!(cycle.path(), "P1 → R1 → P1");
        assert_closed_walk(&graph, &detection);
    }

    #[test]
    fn chain_without_back_edge_is_deadlock_free() {
        let mut graph = ResourceGraph::new();
        let p1 = graph.add_process();
        let p2 = graph.add_process();
        let r1 = graph.add_resource();
        let r2 = graph.add_resource();
        graph.request(p1, r1).expect("P1 waits on R1");
        graph.allocate(r1, p2).expect("R1 held by P2");
        graph.request(p2, r2).expect("P2 waits on R2");
        let detection = find_cycle(&graph);
        assert_eq!(detection, Detection::NoCycle);
        assert_eq!(detection.status_line(), "✅ System is deadlock-free");
    }

    #[test]
    fn finds_four_node_cycle_across_two_resources() {
        let mut graph = ResourceGraph::new();
        let p1 = graph.add_process();
        let p2 = graph.add_process();
        let r1 = graph.add_resource();
        let r2 = graph.add_resource();
        graph.allocate(r1, p1).expect("R1 held by P1");
        graph.allocate(r2, p2).expect("R2 held by P2");
        graph.request(p1, r2).expect("P1 waits on R2");
        graph.request(p2, r1).expect("P2 waits on R1");

        let detection = find_cycle(&graph);
        let cycle = detection.cycle().expect("cycle");
        assert_eq!(cycle.nodes(), vec![p1, r2, p2, r1]);
        assert_eq!(
            detection.status_line(),
            "⚠️ DEADLOCK DETECTED! Cycle: P1 → R2 → P2 → R1 → P1"
        );
        assert_closed_walk(&graph, &detection);
    }

    #[test]
    fn cycle_reachable_only_from_later_root_is_found() {
        let mut graph = ResourceGraph::new();
        let p1 = graph.add_process();
        let p2 = graph.add_process();
        let r1 = graph.add_resource();
        let r2 = graph.add_resource();
        graph.request(p1, r1).expect("P1 waits on R1");
        graph.allocate(r2, p2).expect("R2 held by P2");
        graph.request(p2, r2).expect("P2 waits on R2");

        let detection = find_cycle(&graph);
        assert_eq!(
            detection.cycle().map(|cycle| cycle.nodes()),
            Some(vec![p2, r2])
        );
        assert_closed_walk(&graph, &detection);
    }

    #[test]
    fn detection_is_idempotent_and_read_only() {
        let mut graph = ResourceGraph::new();
        let p1 = graph.add_process();
        let r1 = graph.add_resource();
        graph.allocate(r1, p1).expect("allocate");
        graph.request(p1, r1).expect("request");
        let nodes = graph.node_count();
        let edges = graph.edge_count();

        let first = find_cycle(&graph);
        let second = find_cycle(&graph);
        assert_eq!(first, second);
        assert_eq!(graph.node_count(), nodes);
        assert_eq!(graph.edge_count(), edges);
    }

    fn long_chain(links: u32, closed: bool) -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        let processes: Vec<NodeId> = (0..links).map(|_| graph.add_process()).collect();
        let resources: Vec<NodeId> = (0..links).map(|_| graph.add_resource()).collect();
        for idx in 0..links as usize {
            graph
                .request(processes[idx], resources[idx])
                .expect("process waits on its resource");
            if let Some(holder) = processes.get(idx + 1) {
                graph
                    .allocate(resources[idx], *holder)
                    .expect("resource held by next process");
            } else if closed {
                graph
                    .allocate(resources[idx], processes[0])
                    .expect("last resource held by first process");
            }
        }
        graph
    }

    #[test]
    fn long_open_chain_is_deadlock_free() {
        let graph = long_chain(50_000, false);
        assert_eq!(find_cycle(&graph), Detection::NoCycle);
    }

    #[test]
    fn long_closed_chain_reports_whole_cycle() {
        let graph = long_chain(50_000, true);
        let detection = find_cycle(&graph);
        let cycle = detection.cycle().expect("cycle through the whole chain");
        assert_eq!(cycle.len(), 100_000);
        assert_eq!(cycle.steps()[0].node, NodeId::process(1));
        assert_eq!(cycle.steps()[1].node, NodeId::resource(1));
        assert_eq!(
            cycle.steps().last().map(|step| step.node),
            Some(NodeId::resource(50_000))
        );
    }
}
