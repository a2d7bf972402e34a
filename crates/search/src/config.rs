use crate::error::{Result, SearchError};
use kconfig_indexer::{WalkOptions, EXHAUSTIVE_DEPTH, INDEX_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Subsystem whose unavailable `prefix*` symbols get a "enable the subsystem" hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemRule {
    pub prefix: String,
    /// Root symbol that enables the subsystem
    pub root: String,
    pub label: String,
}

impl SubsystemRule {
    fn new(prefix: &str, root: &str, label: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            root: root.to_string(),
            label: label.to_string(),
        }
    }
}

/// Tunables of the verification engine.
///
/// Directory lists are data so the same engine works on differently shaped trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Workspace-relative directories indexed up front
    pub priority_dirs: Vec<String>,

    /// Directory names never descended into
    pub exclude_names: Vec<String>,

    /// Depth budget for the priority-directory index
    pub index_depth: usize,

    /// Depth budget for the exhaustive workspace scan
    pub exhaustive_depth: usize,

    /// Upper bound on files read by the exhaustive scan
    pub max_exhaustive_files: usize,

    /// Wall-clock budget for the exhaustive scan (0 = unbounded)
    pub exhaustive_budget_ms: u64,

    /// Workspace-relative documentation/manifest files for the semantic fallback
    pub semantic_paths: Vec<String>,

    pub subsystems: Vec<SubsystemRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            priority_dirs: ["zephyr", "nrf", "nrfxlib", "modules", "bootloader"]
                .into_iter()
                .map(String::from)
                .collect(),
            exclude_names: [
                "build",
                "twister-out",
                "node_modules",
                "__pycache__",
                "venv",
                "doc",
                "docs",
                "scripts",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            index_depth: INDEX_DEPTH,
            exhaustive_depth: EXHAUSTIVE_DEPTH,
            max_exhaustive_files: 20_000,
            exhaustive_budget_ms: 30_000,
            semantic_paths: [
                "west.yml",
                "nrf/west.yml",
                "zephyr/west.yml",
                "README.md",
                "README.rst",
                "zephyr/README.rst",
                "nrf/README.rst",
                "zephyr/MAINTAINERS.yml",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            subsystems: vec![
                SubsystemRule::new("BT_", "BT", "Bluetooth"),
                SubsystemRule::new("NET_", "NETWORKING", "networking"),
                SubsystemRule::new("USB_DEVICE_", "USB_DEVICE_STACK", "USB device stack"),
                SubsystemRule::new("NRF_MODEM_", "NRF_MODEM_LIB", "nRF modem library"),
            ],
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: Self =
            toml::from_str(raw).map_err(|err| SearchError::InvalidConfig(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
            SearchError::InvalidConfig(format!("{}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.priority_dirs.is_empty() {
            return Err(SearchError::InvalidConfig(
                "priority_dirs must not be empty".to_string(),
            ));
        }
        if self.index_depth == 0 || self.exhaustive_depth == 0 {
            return Err(SearchError::InvalidConfig(format!(
                "depths must be > 0 (index_depth={}, exhaustive_depth={})",
                self.index_depth, self.exhaustive_depth
            )));
        }
        if self.max_exhaustive_files == 0 {
            return Err(SearchError::InvalidConfig(
                "max_exhaustive_files must be > 0".to_string(),
            ));
        }
        if let Some(rule) = self.subsystems.iter().find(|r| r.prefix.is_empty()) {
            return Err(SearchError::InvalidConfig(format!(
                "subsystem '{}' has an empty prefix",
                rule.root
            )));
        }
        Ok(())
    }

    pub fn index_walk(&self) -> WalkOptions {
        WalkOptions::new(self.exclude_names.iter().cloned(), self.index_depth)
    }

    pub fn exhaustive_walk(&self) -> WalkOptions {
        WalkOptions::new(self.exclude_names.iter().cloned(), self.exhaustive_depth)
    }

    pub fn subsystem_for(&self, name: &str) -> Option<&SubsystemRule> {
        self.subsystems
            .iter()
            .filter(|rule| name.starts_with(&rule.prefix) && name != rule.root)
            .max_by_key(|rule| rule.prefix.len())
    }
}
