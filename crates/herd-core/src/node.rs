//! One managed node of a herdctl deployment.
//!
//! A `Node` carries the static attributes assigned in the node table:
//! name, role, host, capture interface, auxiliary scripts, and any
//! plugin-registered custom keys. Static attributes never change after
//! construction; a configuration reload builds fresh `Node` values.
//!
//! Runtime state (pid, listening port, crashed flag) deliberately does
//! NOT live on the node object. It is written through to the shared
//! [`StateStore`] under `{node-name}-{field}` keys so that it survives
//! restarts of the manager process itself. Callers tearing a node down
//! are responsible for clearing its state keys.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use herd_state::{StateResult, StateStore};

/// Role of a node within the deployment.
///
/// A standalone setup has exactly one `Standalone` node; a cluster has
/// exactly one `Manager` and zero or more `Proxy` and `Worker` nodes.
/// Roles are informational to the messaging layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Standalone,
    Manager,
    Proxy,
    Worker,
    /// Plugin-defined role, kept verbatim.
    #[serde(untagged)]
    Custom(String),
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Standalone => write!(f, "standalone"),
            NodeKind::Manager => write!(f, "manager"),
            NodeKind::Proxy => write!(f, "proxy"),
            NodeKind::Worker => write!(f, "worker"),
            NodeKind::Custom(role) => write!(f, "{role}"),
        }
    }
}

impl FromStr for NodeKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "standalone" => NodeKind::Standalone,
            "manager" => NodeKind::Manager,
            "proxy" => NodeKind::Proxy,
            "worker" => NodeKind::Worker,
            other => NodeKind::Custom(other.to_string()),
        })
    }
}

/// Node keys accepted from the node table besides `type`.
const BUILTIN_KEYS: &[&str] = &["host", "interface", "aux_scripts"];

/// Keys added by plugins at startup. Once registered they behave like
/// built-in keys for description and formatting purposes.
static EXTRA_KEYS: RwLock<BTreeSet<String>> = RwLock::new(BTreeSet::new());

/// Register a custom node key. Used by the plugin registry.
pub fn register_key(name: &str) {
    let mut keys = EXTRA_KEYS.write().unwrap_or_else(|e| e.into_inner());
    keys.insert(name.to_string());
}

/// Whether `name` is a built-in or registered node key.
pub fn is_valid_key(name: &str) -> bool {
    if name == "type" || BUILTIN_KEYS.contains(&name) {
        return true;
    }
    let keys = EXTRA_KEYS.read().unwrap_or_else(|e| e.into_inner());
    keys.contains(name)
}

/// One managed worker process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique name, from the node table section header. State-store
    /// lookups lower-case it.
    pub name: String,
    /// Role of the node.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Hostname of the system the node runs on. Empty if not set.
    #[serde(default)]
    pub host: String,
    /// Network interface for the node to use. Empty if not set.
    #[serde(default)]
    pub interface: String,
    /// Node-specific auxiliary script text. Empty if not set.
    #[serde(default)]
    pub aux_scripts: String,
    /// Network-resolvable host reference used to form the connection
    /// endpoint for control events.
    #[serde(default)]
    pub addr: String,
    /// Plugin-registered custom attributes.
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

impl Node {
    /// Create a node with the given name and role; every other
    /// attribute starts out empty.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            host: String::new(),
            interface: String::new(),
            aux_scripts: String::new(),
            addr: String::new(),
            custom: BTreeMap::new(),
        }
    }

    /// Value of a node key, custom or built-in. Unset keys yield "".
    pub fn attr(&self, key: &str) -> String {
        match key {
            "type" => self.kind.to_string(),
            "host" => self.host.clone(),
            "interface" => self.interface.clone(),
            "aux_scripts" => self.aux_scripts.clone(),
            other => self.custom.get(other).cloned().unwrap_or_default(),
        }
    }

    /// Extended one-line description of the node with all keys.
    pub fn describe(&self) -> String {
        let mut pairs: BTreeMap<&str, String> = BTreeMap::new();
        pairs.insert("name", self.name.clone());
        pairs.insert("type", self.kind.to_string());
        for &key in BUILTIN_KEYS {
            pairs.insert(key, self.attr(key));
        }
        for (key, value) in &self.custom {
            pairs.insert(key.as_str(), value.clone());
        }
        let attrs: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!("{:>15} - {}", self.name, attrs.join(" "))
    }

    /// The node's working directory under the spool directory.
    ///
    /// Pure function of its inputs; does not touch the state store.
    pub fn cwd(&self, spool_dir: &Path) -> PathBuf {
        spool_dir.join(&self.name)
    }

    /// Key for reading runtime state; reads lower-case the node name.
    fn read_key(&self, field: &str) -> String {
        format!("{}-{}", self.name.to_lowercase(), field)
    }

    /// Key for writing runtime state; writes keep the configured case.
    ///
    /// For node names containing uppercase characters this targets a
    /// different key than [`Node::read_key`]. State files of existing
    /// deployments depend on the key spelling, so the asymmetry is kept
    /// as-is rather than silently migrated (see DESIGN.md).
    fn write_key(&self, field: &str) -> String {
        format!("{}-{}", self.name, field)
    }

    /// Process ID of the node's process if one is recorded. Absent,
    /// cleared, or unparsable entries all mean "no pid known".
    pub fn pid(&self, state: &StateStore) -> StateResult<Option<u32>> {
        let value = state.get(&self.read_key("pid"))?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    /// Record the process ID for the node's process.
    pub fn set_pid(&self, state: &StateStore, pid: u32) -> StateResult<()> {
        debug!(node = %self.name, pid, "recording pid");
        state.set(&self.write_key("pid"), &pid.to_string())
    }

    /// Clear the recorded process ID, indicating the process is no
    /// longer running. Writes an empty value; the key stays.
    pub fn clear_pid(&self, state: &StateStore) -> StateResult<()> {
        debug!(node = %self.name, "clearing pid");
        state.set(&self.write_key("pid"), "")
    }

    /// Mark the node's process as having terminated unexpectedly.
    pub fn set_crashed(&self, state: &StateStore) -> StateResult<()> {
        debug!(node = %self.name, "marking node as crashed");
        state.set(&self.write_key("crashed"), "1")
    }

    /// Clear the unexpected-termination mark.
    pub fn clear_crashed(&self, state: &StateStore) -> StateResult<()> {
        state.set(&self.write_key("crashed"), "0")
    }

    /// Whether the node's process has exited abnormally.
    pub fn has_crashed(&self, state: &StateStore) -> StateResult<bool> {
        let value = state.get(&self.read_key("crashed"))?;
        Ok(value.as_deref() == Some("1"))
    }

    /// Port the node's communication endpoint listens on, or -1 if no
    /// port has been recorded yet.
    pub fn port(&self, state: &StateStore) -> StateResult<i64> {
        let value = state.get(&self.read_key("port"))?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(-1))
    }

    /// Record the port the node's communication endpoint listens on.
    pub fn set_port(&self, state: &StateStore, port: u16) -> StateResult<()> {
        state.set(&self.write_key("port"), &port.to_string())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> StateStore {
        StateStore::open_in_memory().unwrap()
    }

    fn worker(name: &str) -> Node {
        Node::new(name, NodeKind::Worker)
    }

    #[test]
    fn pid_roundtrip() {
        let state = test_state();
        let node = worker("worker-1");

        node.set_pid(&state, 1234).unwrap();
        assert_eq!(node.pid(&state).unwrap(), Some(1234));
    }

    #[test]
    fn pid_absent_is_none() {
        let state = test_state();
        assert_eq!(worker("worker-1").pid(&state).unwrap(), None);
    }

    #[test]
    fn pid_cleared_is_none() {
        let state = test_state();
        let node = worker("worker-1");

        node.set_pid(&state, 1234).unwrap();
        node.clear_pid(&state).unwrap();
        assert_eq!(node.pid(&state).unwrap(), None);
        // The key itself stays, with an empty value.
        assert_eq!(state.get("worker-1-pid").unwrap().as_deref(), Some(""));
    }

    #[test]
    fn pid_garbage_is_none() {
        let state = test_state();
        state.set("worker-1-pid", "not-a-pid").unwrap();
        assert_eq!(worker("worker-1").pid(&state).unwrap(), None);
    }

    #[test]
    fn crashed_roundtrip() {
        let state = test_state();
        let node = worker("worker-1");

        assert!(!node.has_crashed(&state).unwrap());
        node.set_crashed(&state).unwrap();
        assert!(node.has_crashed(&state).unwrap());
        node.clear_crashed(&state).unwrap();
        assert!(!node.has_crashed(&state).unwrap());
    }

    #[test]
    fn port_defaults_to_minus_one() {
        let state = test_state();
        assert_eq!(worker("worker-1").port(&state).unwrap(), -1);
    }

    #[test]
    fn port_roundtrip() {
        let state = test_state();
        let node = worker("worker-1");

        node.set_port(&state, 47760).unwrap();
        assert_eq!(node.port(&state).unwrap(), 47760);
    }

    // Pins the historical key-case behavior: writes use the configured
    // name, reads lower-case it, so mixed-case names miss their own
    // writes. Kept for state-file compatibility.
    #[test]
    fn mixed_case_name_write_read_asymmetry() {
        let state = test_state();
        let node = worker("Worker-1");

        node.set_pid(&state, 1234).unwrap();
        assert_eq!(node.pid(&state).unwrap(), None);
        assert_eq!(state.get("Worker-1-pid").unwrap().as_deref(), Some("1234"));
        assert!(state.get("worker-1-pid").unwrap().is_none());
    }

    #[test]
    fn cwd_is_pure_join() {
        let state = test_state();
        let node = worker("worker-1");
        let spool = Path::new("/var/spool/herd");

        assert_eq!(node.cwd(spool), PathBuf::from("/var/spool/herd/worker-1"));
        assert_eq!(node.cwd(spool), node.cwd(spool));
        // No state-store side effects.
        assert!(state.entries().unwrap().is_empty());
    }

    #[test]
    fn new_node_attrs_default_empty() {
        let node = worker("worker-1");
        assert_eq!(node.attr("host"), "");
        assert_eq!(node.attr("interface"), "");
        assert_eq!(node.attr("aux_scripts"), "");
        assert_eq!(node.attr("no-such-key"), "");
    }

    #[test]
    fn kind_parses_known_and_custom_roles() {
        assert_eq!("worker".parse::<NodeKind>().unwrap(), NodeKind::Worker);
        assert_eq!("manager".parse::<NodeKind>().unwrap(), NodeKind::Manager);
        assert_eq!(
            "gateway".parse::<NodeKind>().unwrap(),
            NodeKind::Custom("gateway".to_string())
        );
    }

    #[test]
    fn describe_lists_sorted_keys() {
        let mut node = worker("w1");
        node.host = "host1.example.org".to_string();
        node.custom.insert("rack".to_string(), "r7".to_string());

        let text = node.describe();
        assert!(text.contains("name=w1"));
        assert!(text.contains("type=worker"));
        assert!(text.contains("host=host1.example.org"));
        assert!(text.contains("rack=r7"));
        // Unset keys still show up, empty.
        assert!(text.contains("interface="));
    }

    #[test]
    fn registered_keys_become_valid() {
        assert!(is_valid_key("type"));
        assert!(is_valid_key("interface"));
        assert!(!is_valid_key("datacenter"));

        register_key("datacenter");
        assert!(is_valid_key("datacenter"));
    }
}
