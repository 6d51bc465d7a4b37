//! Message-bus transport adapter — sequential per-node delivery.
//!
//! Each request gets its own short-lived session: peer the node's
//! endpoint, advertise and subscribe a response channel, publish the
//! event on the request channel, then poll the response queue over a
//! fixed window. Session setup and teardown are local and cheap, so
//! overlap across nodes was traded for session-per-node isolation;
//! requests resolve strictly in input order.
//!
//! The polling window is a hardcoded ceiling of six 500 ms ticks. It
//! deliberately does NOT honor the configured communication timeout;
//! the ~3 second bound is observable behavior.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use herd_core::scope_addr;
use herd_state::StateStore;

use crate::error::DispatchError;
use crate::event::{EventRequest, EventResult};

/// Local channel namespace control sessions bind to.
const ENDPOINT_NAME: &str = "control";
/// Peer-link protocol version.
const PROTOCOL_VERSION: u32 = 1;
/// Channel the nodes listen on for control requests.
const REQUEST_TOPIC: &str = "herd/event/control/request/";
/// Channel control replies come back on.
const RESPONSE_TOPIC: &str = "herd/event/control/response/";
/// Fixed pause after requesting the peer link, giving negotiation a
/// chance before the single status poll.
const PEERING_DELAY: Duration = Duration::from_secs(1);
/// Response polling window: 6 ticks of 500 ms each.
const POLL_TICKS: u32 = 6;
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Client bindings for the publish/subscribe bus.
///
/// Same optional-availability contract as the legacy bindings: probed
/// once at process start, absence degrades requests to failures.
pub trait BusBindings: Send + Sync {
    /// Create a session endpoint bound to the given local channel
    /// namespace.
    fn endpoint(&self, name: &str) -> Box<dyn BusEndpoint + Send>;
}

/// One bus session.
pub trait BusEndpoint {
    /// Request a peer link to the node's endpoint.
    fn peer(&mut self, host: &str, port: i64, version: u32);

    /// Drain the outgoing-connection-status queue once. Returns whether
    /// a peer link was confirmed.
    fn peered(&mut self) -> bool;

    /// Advertise interest in a channel.
    fn advertise(&mut self, topic: &str);

    /// Prepare to receive messages on a channel.
    fn subscribe(&mut self, topic: &str) -> Box<dyn BusQueue + Send>;

    /// Mark a channel for publishing.
    fn publish(&mut self, topic: &str);

    /// Ship an ordered payload on a channel.
    fn send(&mut self, topic: &str, payload: &[String]);
}

/// Receive side of a subscribed channel.
pub trait BusQueue {
    /// Drain any arrived messages without blocking.
    fn try_pop(&mut self) -> Vec<Vec<String>>;
}

/// The publish/subscribe transport.
pub struct BusTransport {
    bindings: Option<Arc<dyn BusBindings>>,
}

impl BusTransport {
    pub fn new(bindings: Option<Arc<dyn BusBindings>>) -> Self {
        Self { bindings }
    }

    /// Deliver a batch of events, one result per request, strictly in
    /// input order.
    pub async fn dispatch_batch(
        &self,
        state: &StateStore,
        requests: &[EventRequest],
    ) -> Vec<EventResult> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            let Some(bindings) = &self.bindings else {
                results.push(EventResult::failure(
                    &request.node.name,
                    DispatchError::BindingsUnavailable,
                ));
                continue;
            };

            let result = match self.send_one(bindings.as_ref(), state, request).await {
                Ok(payload) => EventResult::success(&request.node.name, payload),
                Err(e) => EventResult::failure(&request.node.name, e),
            };
            results.push(result);
        }

        results
    }

    /// Run one session: peer, publish, poll for the reply.
    async fn send_one(
        &self,
        bindings: &dyn BusBindings,
        state: &StateStore,
        request: &EventRequest,
    ) -> Result<Vec<String>, DispatchError> {
        let host = scope_addr(&request.node.addr);
        let port = request
            .node
            .port(state)
            .map_err(|e| DispatchError::ConnectionFailed(e.to_string()))?;

        let mut endpoint = bindings.endpoint(ENDPOINT_NAME);
        endpoint.peer(&host, port, PROTOCOL_VERSION);
        debug!(event = %request.event, node = %request.node, %host, port, "peering with node");
        sleep(PEERING_DELAY).await;

        // Single status poll; no retry.
        if !endpoint.peered() {
            debug!(node = %request.node, "no bus connection could be established");
            return Err(DispatchError::PeeringFailed);
        }

        endpoint.advertise(RESPONSE_TOPIC);
        let mut queue = endpoint.subscribe(RESPONSE_TOPIC);
        endpoint.publish(REQUEST_TOPIC);

        // Event name first, then the stringified arguments.
        let mut payload = Vec::with_capacity(request.args.len() + 1);
        payload.push(request.event.clone());
        payload.extend(request.args.iter().map(|a| a.to_string()));
        endpoint.send(REQUEST_TOPIC, &payload);

        let mut reply_event: Option<String> = None;
        let mut reply_args = Vec::new();
        for tick in 0..POLL_TICKS {
            sleep(POLL_INTERVAL).await;
            debug!(tick, node = %request.node, "polling response queue");
            for message in queue.try_pop() {
                for token in message {
                    // The first token of the drain is the reply event
                    // name; everything after it is payload.
                    if reply_event.is_none() {
                        reply_event = Some(token);
                    } else {
                        reply_args.push(token.trim().to_string());
                    }
                }
            }
            if reply_event.is_some() {
                break;
            }
        }

        match reply_event {
            Some(event) => {
                debug!(%event, node = %request.node, payload = ?reply_args, "reply received");
                Ok(reply_args)
            }
            None => {
                debug!(node = %request.node, "no response obtained");
                Err(DispatchError::NoResponse)
            }
        }
    }
}
