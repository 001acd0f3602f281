use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{AnalyzeError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub detectors: DetectorConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Uploads larger than this are rejected with 413.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum distinct counterparties for a smurfing hub.
    pub fan_threshold: usize,
    /// Temporal-confirmation window for smurfing clusters.
    pub window_hours: i64,
    /// Cycle detector: ranked start-node cap.
    pub cycle_start_cap: usize,
    /// Cycle detector: total ring cap.
    pub cycle_ring_cap: usize,
    /// Shell detector: chain cap.
    pub shell_chain_cap: usize,
    /// Shell detection is skipped above this vertex count.
    pub shell_skip_vertices: usize,
    pub cycle_budget_seconds: u64,
    pub smurfing_budget_seconds: u64,
    pub shell_budget_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    /// Node cap of the visualisation payload.
    pub node_cap: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fan_threshold: 10,
            window_hours: 72,
            cycle_start_cap: 300,
            cycle_ring_cap: 500,
            shell_chain_cap: 200,
            shell_skip_vertices: 2000,
            cycle_budget_seconds: 12,
            smurfing_budget_seconds: 10,
            shell_budget_seconds: 10,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { node_cap: 500 }
    }
}

impl Config {
    /// Read the TOML config at `path`. A missing file is not an error: the
    /// engine's defaults stand in for it. An unreadable or invalid file is
    /// reported as [`AnalyzeError::Config`] so the caller decides whether
    /// to abort or run on defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, running on defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AnalyzeError::Config(format!("read {}: {e}", path.display())))?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| AnalyzeError::Config(format!("parse {}: {e}", path.display())))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}
