//! herd-comm — control-event messaging to running nodes.
//!
//! Delivers named control events ("reload configuration", "report
//! status") to a set of nodes, optionally waits for a correlated reply
//! event, and returns a uniform per-node outcome regardless of which
//! wire transport is configured.
//!
//! # Architecture
//!
//! ```text
//! Dispatcher::send_events_parallel(batch)
//!   ├── selects ONE transport for the whole batch (herd.toml)
//!   ├── LegacyTransport — two-phase pipelining
//!   │     ├── initiate: connect + subscribe + send per node
//!   │     └── wait: 1 s poll ticks, configured timeout
//!   └── BusTransport — strictly sequential sessions
//!         ├── peer + advertise + publish per node
//!         └── poll response queue, fixed 6 × 500 ms window
//! ```
//!
//! Both transports' client libraries are optional at runtime and are
//! modeled as binding traits resolved once at startup; a missing
//! binding degrades every request of a batch to an immediate failure
//! instead of aborting the call. No failure ever propagates to the
//! caller as an error: each becomes a failed [`EventResult`] in that
//! node's slot.

pub mod bus;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod legacy;

pub use bus::{BusBindings, BusEndpoint, BusQueue, BusTransport};
pub use dispatch::Dispatcher;
pub use error::DispatchError;
pub use event::{EventArg, EventRequest, EventResult};
pub use legacy::{LegacyBindings, LegacyConnection, LegacyTransport};
