use std::path::PathBuf;

use serde::Deserialize;

use crate::graph::connect::PolicyKind;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RagConfig {
    #[serde(default)]
    pub simulator: SimulatorSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub batch: BatchSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulatorSettings {
    #[serde(default)]
    pub policy: PolicyKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub template: Option<PathBuf>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            template: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchSettings {
    #[serde(default)]
    pub jobs: Option<usize>,
}

fn default_format() -> String {
    "text".to_string()
}
