use std::env;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, RagConfig};
use crate::graph::connect::PolicyKind;

pub const CONFIG_FILE_NAME: &str = "ragsim.toml";

#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    /// `None` when no file was found and defaults are in effect.
    pub path: Option<PathBuf>,
    pub config: RagConfig,
}

pub fn resolve_config(
    start: impl AsRef<Path>,
    config_path: Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError> {
    let env_path = env::var("RAGSIM_CONFIG").ok().map(PathBuf::from);
    let mut resolved = resolve_config_with(start.as_ref(), config_path, env_path)?;
    apply_overrides(
        &mut resolved.config,
        env::var("RAGSIM_POLICY").ok(),
        env::var("RAGSIM_JOBS").ok(),
    )?;
    Ok(resolved)
}

fn resolve_config_with(
    start: &Path,
    config_path: Option<PathBuf>,
    env_path: Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError> {
    if let Some(path) = config_path.or(env_path) {
        let config = load_config(&path)?;
        return Ok(ResolvedConfig {
            path: Some(path),
            config,
        });
    }

    match find_config_from(start) {
        Some(path) => {
            let config = load_config(&path)?;
            Ok(ResolvedConfig {
                path: Some(path),
                config,
            })
        }
        None => Ok(ResolvedConfig::default()),
    }
}

pub fn load_config(path: &Path) -> Result<RagConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_overrides(
    config: &mut RagConfig,
    policy: Option<String>,
    jobs: Option<String>,
) -> Result<(), ConfigError> {
    if let Some(value) = policy {
        config.simulator.policy = value.parse::<PolicyKind>().map_err(|_| {
            ConfigError::InvalidValue {
                key: "RAGSIM_POLICY".to_string(),
                value: value.clone(),
            }
        })?;
    }

    if let Some(value) = jobs {
        let parsed = value
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "RAGSIM_JOBS".to_string(),
                value: value.clone(),
            })?;
        config.batch.jobs = Some(parsed);
    }

    Ok(())
}

fn find_config_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|ancestor| ancestor.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}
