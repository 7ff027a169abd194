pub mod edge;
pub mod node;
pub mod scenario;
pub mod simulator;

pub use edge::{Edge, EdgeKind};
pub use node::{NodeId, Role};
pub use scenario::{load_scenario, Scenario, ScenarioRun, Step};
pub use simulator::Simulator;
