use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::node::NodeId;
use crate::core::simulator::Simulator;
use crate::error::{RagError, Result};
use crate::graph::connect::PolicyKind;
use crate::graph::detect::Detection;
use crate::graph::store::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    AddProcess,
    AddResource,
    Allocate { resource: NodeId, process: NodeId },
    Request { process: NodeId, resource: NodeId },
    Detect,
    Reset,
}

/// A script of simulator operations, loaded from TOML, JSON or YAML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub policy: Option<PolicyKind>,
    #[serde(default)]
    pub expect_deadlock: Option<bool>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub name: String,
    pub policy: &'static str,
    pub messages: Vec<String>,
    pub snapshot: Snapshot,
    pub detection: Detection,
    pub expected: Option<bool>,
}

impl ScenarioRun {
    /// `None` when the scenario states no expectation.
    pub fn meets_expectation(&self) -> Option<bool> {
        self.expected
            .map(|expected| expected == self.detection.is_deadlocked())
    }
}

impl Scenario {
    /// Add process, add resource, add process: the walkthrough that ends with
    /// P1 and P2 contending for R1.
    pub fn demo() -> Self {
        Self {
            name: Some("demo".to_string()),
            policy: Some(PolicyKind::Storytelling),
            expect_deadlock: Some(true),
            steps: vec![Step::AddProcess, Step::AddResource, Step::AddProcess],
        }
    }

    pub fn display_name(&self, fallback: &str) -> String {
        self.name.clone().unwrap_or_else(|| fallback.to_string())
    }

    pub fn run(&self, default_policy: PolicyKind) -> Result<ScenarioRun> {
        let policy = self.policy.unwrap_or(default_policy);
        let mut sim = Simulator::with_policy(policy);
        let mut messages = Vec::new();
        for step in &self.steps {
            messages.extend(sim.apply(step)?);
        }
        Ok(ScenarioRun {
            name: self.display_name("scenario"),
            policy: sim.policy(),
            messages,
            snapshot: sim.snapshot(),
            detection: sim.detect_deadlock(),
            expected: self.expect_deadlock,
        })
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    if !path.is_file() {
        return Err(scenario_error(path, "file not found"));
    }

    let content = std::fs::read_to_string(path)?;
    let mut scenario = parse_scenario(path, &content)?;
    if scenario.name.is_none() {
        scenario.name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string);
    }
    Ok(scenario)
}

pub fn parse_scenario(path: &Path, content: &str) -> Result<Scenario> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "toml" => toml::from_str(content).map_err(|err| scenario_error(path, err)),
        "json" => serde_json::from_str(content).map_err(|err| scenario_error(path, err)),
        "yaml" | "yml" => serde_yaml::from_str(content).map_err(|err| scenario_error(path, err)),
        other => Err(scenario_error(
            path,
            format!("unsupported scenario format '{}'", other),
        )),
    }
}

fn scenario_error(path: &Path, message: impl ToString) -> RagError {
    RagError::Scenario {
        path: PathBuf::from(path),
        message: message.to_string(),
    }
}
