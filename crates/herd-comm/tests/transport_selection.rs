//! End-to-end transport selection through the dispatcher.
//!
//! Verifies that the configured transport is chosen once per batch and
//! that the other transport's bindings are never touched.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use herd_comm::{
    BusBindings, BusEndpoint, BusQueue, Dispatcher, EventArg, EventRequest, LegacyBindings,
    LegacyConnection,
};
use herd_core::{HerdConfig, Node, NodeKind, TransportKind};
use herd_state::StateStore;

#[derive(Default)]
struct CountingLegacy {
    opened: AtomicUsize,
}

impl LegacyBindings for CountingLegacy {
    fn open(&self, _endpoint: &str) -> io::Result<Box<dyn LegacyConnection + Send>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(NullConnection))
    }
}

struct NullConnection;

impl LegacyConnection for NullConnection {
    fn subscribe(&mut self, _event: &str) {}

    fn connect(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn send(&mut self, _event: &str, _args: &[EventArg]) {}

    fn process_input(&mut self) -> bool {
        false
    }

    fn take_reply(&mut self) -> Option<Vec<String>> {
        None
    }
}

#[derive(Default)]
struct CountingBus {
    sessions: AtomicUsize,
}

impl BusBindings for CountingBus {
    fn endpoint(&self, _name: &str) -> Box<dyn BusEndpoint + Send> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Box::new(AckEndpoint)
    }
}

struct AckEndpoint;

impl BusEndpoint for AckEndpoint {
    fn peer(&mut self, _host: &str, _port: i64, _version: u32) {}

    fn peered(&mut self) -> bool {
        true
    }

    fn advertise(&mut self, _topic: &str) {}

    fn subscribe(&mut self, _topic: &str) -> Box<dyn BusQueue + Send> {
        Box::new(AckQueue { popped: false })
    }

    fn publish(&mut self, _topic: &str) {}

    fn send(&mut self, _topic: &str, _payload: &[String]) {}
}

struct AckQueue {
    popped: bool,
}

impl BusQueue for AckQueue {
    fn try_pop(&mut self) -> Vec<Vec<String>> {
        if self.popped {
            return vec![];
        }
        self.popped = true;
        vec![vec!["ack".to_string()]]
    }
}

fn batch(state: &StateStore, names: &[&str]) -> Vec<EventRequest> {
    names
        .iter()
        .map(|name| {
            let mut node = Node::new(*name, NodeKind::Worker);
            node.addr = "127.0.0.1".to_string();
            node.set_port(state, 47760).unwrap();
            EventRequest::new(node, "reload", vec![], None)
        })
        .collect()
}

fn setup(transport: TransportKind) -> (Dispatcher, Arc<CountingLegacy>, Arc<CountingBus>, StateStore)
{
    let config = HerdConfig {
        transport,
        ..Default::default()
    };
    let state = StateStore::open_in_memory().unwrap();
    let legacy = Arc::new(CountingLegacy::default());
    let bus = Arc::new(CountingBus::default());
    let dispatcher = Dispatcher::new(
        &config,
        state.clone(),
        Some(legacy.clone() as Arc<dyn LegacyBindings>),
        Some(bus.clone() as Arc<dyn BusBindings>),
    );
    (dispatcher, legacy, bus, state)
}

#[tokio::test]
async fn legacy_config_never_touches_bus_bindings() {
    let (dispatcher, legacy, bus, state) = setup(TransportKind::Legacy);
    let requests = batch(&state, &["worker-1", "worker-2", "proxy-1"]);

    let results = dispatcher.send_events_parallel(&requests).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_success()));
    assert_eq!(legacy.opened.load(Ordering::SeqCst), 3);
    assert_eq!(bus.sessions.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn bus_config_never_touches_legacy_bindings() {
    let (dispatcher, legacy, bus, state) = setup(TransportKind::Bus);
    let requests = batch(&state, &["worker-1", "worker-2"]);

    let results = dispatcher.send_events_parallel(&requests).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_success()));
    assert_eq!(bus.sessions.load(Ordering::SeqCst), 2);
    assert_eq!(legacy.opened.load(Ordering::SeqCst), 0);
}
