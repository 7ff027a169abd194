use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::edge::EdgeKind;
use crate::core::node::NodeId;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("{kind} edge cannot run from {from} to {to}")]
    MisdirectedEdge {
        kind: EdgeKind,
        from: NodeId,
        to: NodeId,
    },
    #[error("invalid node id '{0}'")]
    InvalidNodeId(String),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("scenario {path}: {message}")]
    Scenario { path: PathBuf, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;
