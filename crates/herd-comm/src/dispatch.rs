//! Dispatch coordinator — fans a batch of control events across nodes.

use std::sync::Arc;

use tracing::debug;

use herd_core::{HerdConfig, TransportKind};
use herd_state::StateStore;

use crate::bus::{BusBindings, BusTransport};
use crate::event::{EventRequest, EventResult};
use crate::legacy::{LegacyBindings, LegacyTransport};

/// The transport selected for one batch. Exactly one variant is active
/// per call; the two are never mixed within a batch.
enum Transport<'a> {
    Legacy(&'a LegacyTransport),
    Bus(&'a BusTransport),
}

/// Delivers control events to nodes over the configured transport.
///
/// Built once at startup from the configuration and whichever transport
/// bindings this process managed to load. `send_events_parallel` is the
/// sole operation this subsystem exposes.
pub struct Dispatcher {
    state: StateStore,
    transport: TransportKind,
    legacy: LegacyTransport,
    bus: BusTransport,
}

impl Dispatcher {
    pub fn new(
        config: &HerdConfig,
        state: StateStore,
        legacy_bindings: Option<Arc<dyn LegacyBindings>>,
        bus_bindings: Option<Arc<dyn BusBindings>>,
    ) -> Self {
        Self {
            state,
            transport: config.transport,
            legacy: LegacyTransport::new(legacy_bindings, config.comm_timeout_secs),
            bus: BusTransport::new(bus_bindings),
        }
    }

    /// Deliver a batch of control events, returning one result per
    /// request.
    ///
    /// All failures — missing bindings, unreachable nodes, timeouts —
    /// surface as failed results in the affected node's slot; nothing
    /// propagates as an error and one node's failure never aborts its
    /// siblings. The legacy transport resolves deferred replies after
    /// all sends, so callers correlate by node name rather than
    /// position.
    pub async fn send_events_parallel(&self, requests: &[EventRequest]) -> Vec<EventResult> {
        match self.select() {
            Transport::Legacy(transport) => {
                debug!(batch = requests.len(), "dispatching via legacy transport");
                transport.dispatch_batch(&self.state, requests).await
            }
            Transport::Bus(transport) => {
                debug!(batch = requests.len(), "dispatching via message bus");
                transport.dispatch_batch(&self.state, requests).await
            }
        }
    }

    /// One transport per batch, chosen once at the coordinator
    /// boundary.
    fn select(&self) -> Transport<'_> {
        match self.transport {
            TransportKind::Legacy => Transport::Legacy(&self.legacy),
            TransportKind::Bus => Transport::Bus(&self.bus),
        }
    }
}
