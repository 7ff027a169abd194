use crate::core::node::NodeId;
use crate::core::scenario::Step;
use crate::error::Result;
use crate::graph::connect::{policy_for, ConnectPolicy, PolicyKind};
use crate::graph::detect::{find_cycle, Detection};
use crate::graph::store::{ResourceGraph, Snapshot};

/// One simulation session. Owns its graph outright; hosts that run several
/// sessions keep one `Simulator` per session.
pub struct Simulator {
    graph: ResourceGraph,
    policy: Box<dyn ConnectPolicy>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("graph", &self.graph)
            .field("policy", &self.policy.id())
            .finish()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::with_policy(PolicyKind::default())
    }

    pub fn with_policy(kind: PolicyKind) -> Self {
        Self::with_connector(policy_for(kind))
    }

    pub fn with_connector(policy: Box<dyn ConnectPolicy>) -> Self {
        Self {
            graph: ResourceGraph::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &'static str {
        self.policy.id()
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    pub fn add_process(&mut self) -> NodeId {
        self.graph.add_process()
    }

    pub fn add_resource(&mut self) -> NodeId {
        self.graph.add_resource()
    }

    pub fn auto_connect(&mut self) -> Result<Vec<String>> {
        self.policy.connect(&mut self.graph)
    }

    pub fn allocate(&mut self, resource: NodeId, process: NodeId) -> Result<()> {
        self.graph.allocate(resource, process)
    }

    pub fn request(&mut self, process: NodeId, resource: NodeId) -> Result<()> {
        self.graph.request(process, resource)
    }

    pub fn detect_deadlock(&self) -> Detection {
        find_cycle(&self.graph)
    }

    pub fn reset(&mut self) {
        self.graph.reset();
    }

    pub fn snapshot(&self) -> Snapshot {
        self.graph.snapshot()
    }

    /// Runs one step the way a front-end button would: node additions are
    /// followed by the auto-connect pass. Returns the lines to show the user.
    pub fn apply(&mut self, step: &Step) -> Result<Vec<String>> {
        let mut messages = Vec::new();
        match step {
            Step::AddProcess => {
                let id = self.add_process();
                messages.push(format!("Added process: {}", id));
                messages.extend(self.auto_connect()?);
            }
            Step::AddResource => {
                let id = self.add_resource();
                messages.push(format!("Added resource: {}", id));
                messages.extend(self.auto_connect()?);
            }
            Step::Allocate { resource, process } => {
                self.allocate(*resource, *process)?;
                messages.push(format!("Allocated {} → {}", resource, process));
            }
            Step::Request { process, resource } => {
                self.request(*process, *resource)?;
                messages.push(format!("Requested {} → {}", process, resource));
            }
            Step::Detect => messages.push(self.detect_deadlock().status_line()),
            Step::Reset => {
                self.reset();
                messages.push("Simulator reset - all processes and resources cleared".to_string());
            }
        }
        Ok(messages)
    }
}
