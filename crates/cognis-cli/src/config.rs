//! The gateway process's own TOML config: where the SQLite workspace
//! lives, what address to bind, and the brain identity/lifecycle
//! thresholds handed down to `cognis-sdk::BrainConfig`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub brain: cognis_sdk::BrainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr(), brain: cognis_sdk::BrainConfig::default() }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}

impl Config {
    pub fn load(data_dir: &std::path::Path) -> Result<Self> {
        Self::load_from(&data_dir.join("config.toml"))
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, data_dir: &std::path::Path) -> Result<()> {
        self.save_to(&data_dir.join("config.toml"))
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Resolve the workspace data directory: explicit flag, then
/// `COGNIS_PATH`, then the XDG data dir, then `~/.cognis`.
pub fn resolve_data_dir(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand_tilde(path));
    }
    if let Ok(env_path) = std::env::var("COGNIS_PATH") {
        return Ok(expand_tilde(&env_path));
    }
    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("cognis"));
    }
    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".cognis"));
    }
    Err(anyhow::anyhow!("could not determine a data directory: no HOME or XDG data dir found"))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
