use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::node::NodeId;
use crate::error::{RagError, Result};
use crate::graph::store::ResourceGraph;

/// Decides which edges to draw after a node has been added.
pub trait ConnectPolicy: Send + Sync {
    fn id(&self) -> &'static str;
    /// Mutates `graph` and returns one message per edge added, in order.
    fn connect(&self, graph: &mut ResourceGraph) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Storytelling,
    Manual,
}

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Storytelling => "storytelling",
            PolicyKind::Manual => "manual",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = RagError;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "storytelling" | "default" => Ok(PolicyKind::Storytelling),
            "manual" | "none" => Ok(PolicyKind::Manual),
            other => Err(RagError::Other(anyhow::anyhow!(format!(
                "unknown connect policy '{}'",
                other
            )))),
        }
    }
}

pub fn policy_for(kind: PolicyKind) -> Box<dyn ConnectPolicy> {
    match kind {
        PolicyKind::Storytelling => Box::new(StorytellingPolicy),
        PolicyKind::Manual => Box::new(ManualPolicy),
    }
}

/// Wires the newest resource to the newest process, and has the previous
/// process request the newest resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorytellingPolicy;

impl ConnectPolicy for StorytellingPolicy {
    fn id(&self) -> &'static str {
        "storytelling"
    }

    fn connect(&self, graph: &mut ResourceGraph) -> Result<Vec<String>> {
        let processes = graph.process_count();
        let resources = graph.resource_count();
        let mut messages = Vec::new();

        if resources >= 1 && processes >= 1 {
            let resource = NodeId::resource(resources);
            let process = NodeId::process(processes);
            graph.allocate(resource, process)?;
            messages.push(format!("Allocated {} → {}", resource, process));
        }

        if resources >= 1 && processes >= 2 {
            let resource = NodeId::resource(resources);
            let process = NodeId::process(processes - 1);
            graph.request(process, resource)?;
            messages.push(format!("Requested {} → {}", process, resource));
        }

        Ok(messages)
    }
}

/// Never adds edges; scenarios wire them explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualPolicy;

impl ConnectPolicy for ManualPolicy {
    fn id(&self) -> &'static str {
        "manual"
    }

    fn connect(&self, _graph: &mut ResourceGraph) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
