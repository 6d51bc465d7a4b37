//! Legacy transport adapter — two-phase pipelined event delivery.
//!
//! Drives a connect/subscribe/send/poll-for-reply sequence against each
//! node. The batch is split into an initiate phase (connect and send to
//! every node, in request order) and a wait phase (drain and poll each
//! deferred connection, in deferral order). Phase separation lets sends
//! to all reachable nodes happen before any node's wait begins, so
//! per-node latencies overlap even though the input-processing step
//! itself is a blocking, single-connection call.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use herd_core::scope_addr;
use herd_state::StateStore;

use crate::error::DispatchError;
use crate::event::{EventArg, EventRequest, EventResult};

/// Poll interval for both the outbound-drain and the reply wait.
const TICK: Duration = Duration::from_secs(1);

/// Client bindings for the legacy event protocol.
///
/// Availability is probed once at process start; a transport without
/// bindings degrades every request to an immediate failure.
pub trait LegacyBindings: Send + Sync {
    /// Open a queued connection to `host:port`. The connection is not
    /// established until [`LegacyConnection::connect`] is called.
    fn open(&self, endpoint: &str) -> io::Result<Box<dyn LegacyConnection + Send>>;
}

/// One queued point-to-point connection.
pub trait LegacyConnection {
    /// Register interest in a reply event. Must happen before
    /// `connect`.
    fn subscribe(&mut self, event: &str);

    /// Trigger connection establishment.
    fn connect(&mut self) -> io::Result<()>;

    /// Queue the named event with its arguments for sending.
    fn send(&mut self, event: &str, args: &[EventArg]);

    /// Drive the connection's I/O once. Returns whether outbound work
    /// is still pending.
    fn process_input(&mut self) -> bool;

    /// Arguments captured for a subscribed reply event, if one arrived.
    fn take_reply(&mut self) -> Option<Vec<String>>;
}

/// A request that sent successfully and awaits its reply event.
struct Pending {
    node: String,
    result_event: Option<String>,
    conn: Box<dyn LegacyConnection + Send>,
}

/// The point-to-point event-subscription transport.
pub struct LegacyTransport {
    bindings: Option<Arc<dyn LegacyBindings>>,
    /// Maximum wait in whole seconds for each of the two wait loops.
    timeout_secs: u64,
}

impl LegacyTransport {
    pub fn new(bindings: Option<Arc<dyn LegacyBindings>>, timeout_secs: u64) -> Self {
        Self {
            bindings,
            timeout_secs,
        }
    }

    /// Deliver a batch of events, one result per request.
    ///
    /// Initiate-phase failures land at their request's position; waited
    /// results follow in deferral order.
    pub async fn dispatch_batch(
        &self,
        state: &StateStore,
        requests: &[EventRequest],
    ) -> Vec<EventResult> {
        let mut results = Vec::with_capacity(requests.len());
        let mut pending = Vec::new();

        for request in requests {
            let Some(bindings) = &self.bindings else {
                results.push(EventResult::failure(
                    &request.node.name,
                    DispatchError::BindingsUnavailable,
                ));
                continue;
            };

            match self.initiate(bindings.as_ref(), state, request) {
                Ok(conn) => {
                    if request.result_event.is_some() {
                        pending.push(Pending {
                            node: request.node.name.clone(),
                            result_event: request.result_event.clone(),
                            conn,
                        });
                    } else {
                        results.push(EventResult::success(&request.node.name, Vec::new()));
                    }
                }
                Err(e) => results.push(EventResult::failure(&request.node.name, e)),
            }
        }

        for mut entry in pending {
            let outcome = self
                .wait(&entry.node, entry.result_event.as_deref(), entry.conn.as_mut())
                .await;
            results.push(match outcome {
                Ok(args) => EventResult::success(&entry.node, args),
                Err(e) => EventResult::failure(&entry.node, e),
            });
        }

        results
    }

    /// Connect to the node and queue the event. Errors here resolve the
    /// request immediately; no wait phase follows.
    fn initiate(
        &self,
        bindings: &dyn LegacyBindings,
        state: &StateStore,
        request: &EventRequest,
    ) -> Result<Box<dyn LegacyConnection + Send>, DispatchError> {
        let host = scope_addr(&request.node.addr);
        let port = request
            .node
            .port(state)
            .map_err(|e| DispatchError::ConnectionFailed(e.to_string()))?;
        let endpoint = format!("{host}:{port}");

        let mut conn = bindings.open(&endpoint).map_err(|e| {
            debug!(node = %request.node, "cannot connect to node");
            DispatchError::ConnectionFailed(e.to_string())
        })?;
        if let Some(result_event) = &request.result_event {
            conn.subscribe(result_event);
        }
        if let Err(e) = conn.connect() {
            debug!(node = %request.node, "cannot connect to node");
            return Err(DispatchError::ConnectionFailed(e.to_string()));
        }

        debug!(event = %request.event, node = %request.node, "sending event");
        conn.send(&request.event, &request.args);
        Ok(conn)
    }

    /// Drain outbound work, then poll for the reply event. Both loops
    /// tick once per second against the configured timeout.
    async fn wait(
        &self,
        node: &str,
        result_event: Option<&str>,
        conn: &mut (dyn LegacyConnection + Send),
    ) -> Result<Vec<String>, DispatchError> {
        let mut ticks = 0u64;
        while conn.process_input() {
            sleep(TICK).await;
            ticks += 1;
            if ticks > self.timeout_secs {
                debug!(%node, "timeout during send to node");
                return Err(DispatchError::Timeout);
            }
        }

        let Some(result_event) = result_event else {
            return Ok(Vec::new());
        };

        let mut ticks = 0u64;
        conn.process_input();
        loop {
            if let Some(args) = conn.take_reply() {
                debug!(event = %result_event, %node, "reply received from node");
                return Ok(args);
            }
            sleep(TICK).await;
            conn.process_input();
            ticks += 1;
            if ticks > self.timeout_secs {
                debug!(%node, "timeout during receive from node");
                return Err(DispatchError::Timeout);
            }
        }
    }
}
