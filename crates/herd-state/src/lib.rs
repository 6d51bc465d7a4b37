//! herd-state — persisted runtime state for herdctl.
//!
//! Backed by [redb](https://docs.rs/redb), this crate holds the flat
//! string key/value table that survives restarts of the manager process
//! itself: per-node process ids, listening ports, and crashed flags.
//!
//! Keys follow the `{node-name}-{field}` convention (`worker-1-pid`,
//! `worker-1-port`, `worker-1-crashed`); the convention is owned by the
//! `Node` accessors in `herd-core`, the store treats keys as opaque.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`). An in-memory backend is available for tests.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::StateStore;
