pub mod connect;
pub mod detect;
pub mod store;
pub mod viz;

pub use connect::{policy_for, ConnectPolicy, PolicyKind};
pub use detect::{find_cycle, Cycle, CycleStep, Detection};
pub use store::{NodeView, ResourceGraph, Snapshot};
