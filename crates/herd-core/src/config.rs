//! herd.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which wire transport carries control events to the nodes.
///
/// Exactly one transport is active per deployment; the dispatcher never
/// mixes the two within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Point-to-point event subscription protocol (connect, subscribe,
    /// send, poll).
    #[default]
    Legacy,
    /// Publish/subscribe message bus (peer, advertise, publish, poll a
    /// response queue).
    Bus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HerdConfig {
    /// Active control-event transport.
    #[serde(default)]
    pub transport: TransportKind,
    /// Communication timeout in whole seconds. Only the legacy transport
    /// honors this; the bus transport's polling window is fixed.
    #[serde(default = "default_comm_timeout")]
    pub comm_timeout_secs: u64,
    /// Base directory under which each node gets a working directory.
    #[serde(default = "default_spool_dir")]
    pub spool_dir: PathBuf,
}

fn default_comm_timeout() -> u64 {
    10
}

fn default_spool_dir() -> PathBuf {
    PathBuf::from("/var/spool/herd")
}

impl Default for HerdConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            comm_timeout_secs: default_comm_timeout(),
            spool_dir: default_spool_dir(),
        }
    }
}

impl HerdConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HerdConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
