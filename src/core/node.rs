use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Process,
    Resource,
}

impl Role {
    pub fn tag(self) -> char {
        match self {
            Role::Process => 'P',
            Role::Resource => 'R',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Process => "process",
            Role::Resource => "resource",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Role::Process => "#66b3ff",
            Role::Resource => "#99ff99",
        }
    }

    pub fn shape(self) -> &'static str {
        match self {
            Role::Process => "box",
            Role::Resource => "diamond",
        }
    }
}

/// Identity of a graph node: a role tag plus the per-role sequence number,
/// rendered as `P<k>` or `R<k>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NodeId {
    role: Role,
    seq: u32,
}

impl NodeId {
    pub fn new(role: Role, seq: u32) -> Self {
        Self { role, seq }
    }

    pub fn process(seq: u32) -> Self {
        Self::new(Role::Process, seq)
    }

    pub fn resource(seq: u32) -> Self {
        Self::new(Role::Resource, seq)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn is_process(&self) -> bool {
        self.role == Role::Process
    }

    pub fn is_resource(&self) -> bool {
        self.role == Role::Resource
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.role.tag(), self.seq)
    }
}

fn node_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*([PpRr])([1-9][0-9]*)\s*$").expect("valid node id regex"))
}

impl FromStr for NodeId {
    type Err = RagError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let captures = node_id_pattern()
            .captures(input)
            .ok_or_else(|| RagError::InvalidNodeId(input.to_string()))?;
        let role = match &captures[1] {
            "P" | "p" => Role::Process,
            _ => Role::Resource,
        };
        let seq = captures[2]
            .parse::<u32>()
            .map_err(|_| RagError::InvalidNodeId(input.to_string()))?;
        Ok(Self::new(role, seq))
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for NodeId {
    type Error = RagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
