use std::{
    env, fs, io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use bridge_runtime::{capability_registry, CapabilityFlags, CapabilityValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming a JSON config file that overrides the defaults.
pub const BRIDGE_CONFIG_ENV: &str = "BRIDGE_CONFIG_PATH";

pub const DEFAULT_SNAPSHOT_CADENCE: u64 = 60;

/// Deployment configuration for a bridge instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Steps between periodic snapshot emissions.
    pub snapshot_cadence: u64,
    /// Write the response artifact after every dispatched command.
    pub flush_on_dispatch: bool,
    pub handlers: HandlerSettings,
    pub output_dir: PathBuf,
    pub command_bind: SocketAddr,
    pub tick_rate_hz: u32,
    /// Privileged capability ids to enable, e.g. `admin.execute`.
    pub privileged: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            snapshot_cadence: DEFAULT_SNAPSHOT_CADENCE,
            flush_on_dispatch: true,
            handlers: HandlerSettings::default(),
            output_dir: PathBuf::from("script-output").join("sim_bridge"),
            command_bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 41101),
            tick_rate_hz: 60,
            privileged: Vec::new(),
        }
    }
}

/// Radii and limits shared by the handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerSettings {
    /// Radius around a given point searched by point-targeted commands.
    pub search_radius: f64,
    pub scan_radius: f64,
    pub resource_radius: f64,
    pub pickup_radius: f64,
    pub max_scan_results: usize,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            search_radius: 1.0,
            scan_radius: 10.0,
            resource_radius: 50.0,
            pickup_radius: 2.0,
            max_scan_results: 200,
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeConfigError {
    #[error("failed to parse bridge config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read bridge config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid privileged capabilities: {0}")]
    Capabilities(#[from] CapabilityValidationError),
}

impl BridgeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, BridgeConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, BridgeConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| BridgeConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        BridgeConfig::from_json_str(&contents)
    }

    /// Load from [`BRIDGE_CONFIG_ENV`] when set, otherwise use the defaults.
    pub fn from_env() -> Result<Self, BridgeConfigError> {
        match env::var_os(BRIDGE_CONFIG_ENV) {
            Some(path) => BridgeConfig::from_file(Path::new(&path)),
            None => Ok(BridgeConfig::default()),
        }
    }

    pub fn snapshot_cadence(&self) -> u64 {
        self.snapshot_cadence.max(1)
    }

    pub fn capabilities(&self) -> Result<CapabilityFlags, BridgeConfigError> {
        Ok(capability_registry().resolve(&self.privileged)?)
    }

    pub fn responses_path(&self) -> PathBuf {
        self.output_dir.join("responses.json")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.output_dir.join("state.json")
    }
}
