//! redb table definition for the herdctl state store.
//!
//! A single flat table of string keys and string values. Node runtime
//! state uses `{node-name}-{field}` keys; other subsystems may park
//! their own keys here as long as they do not collide.

use redb::TableDefinition;

/// Runtime state keyed by `{node-name}-{field}` convention strings.
pub const STATE: TableDefinition<&str, &str> = TableDefinition::new("state");
