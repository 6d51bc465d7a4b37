//! herd-core — configuration and node model for herdctl.
//!
//! A herdctl deployment is described by `herd.toml` (which transport to
//! use for control events, communication timeout, spool directory) plus
//! a node table assigning each managed worker process a name, a role,
//! and a host. This crate owns those types and the accessors that bridge
//! a node's runtime state (pid, port, crashed flag) into the persisted
//! [`herd_state::StateStore`].

pub mod addr;
pub mod config;
pub mod node;

pub use addr::scope_addr;
pub use config::{HerdConfig, TransportKind};
pub use node::{Node, NodeKind, is_valid_key, register_key};
