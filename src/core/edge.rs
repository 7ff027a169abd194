use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::node::{NodeId, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Resource held by a process (resource -> process).
    Allocation,
    /// Process waiting on a resource (process -> resource).
    Request,
}

impl EdgeKind {
    pub fn source_role(self) -> Role {
        match self {
            EdgeKind::Allocation => Role::Resource,
            EdgeKind::Request => Role::Process,
        }
    }

    pub fn target_role(self) -> Role {
        match self {
            EdgeKind::Allocation => Role::Process,
            EdgeKind::Request => Role::Resource,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            EdgeKind::Allocation => "black",
            EdgeKind::Request => "red",
        }
    }

    pub fn style(self) -> &'static str {
        match self {
            EdgeKind::Allocation => "solid",
            EdgeKind::Request => "dashed",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Allocation => f.write_str("allocation"),
            EdgeKind::Request => f.write_str("request"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, kind: EdgeKind) -> Self {
        Self { from, to, kind }
    }

    /// Whether the endpoint roles agree with the direction `kind` requires.
    pub fn is_well_directed(&self) -> bool {
        self.from.role() == self.kind.source_role() && self.to.role() == self.kind.target_role()
    }
}
