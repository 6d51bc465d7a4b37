//! Control event requests and per-node outcomes.

use std::fmt;

use herd_core::Node;

/// One argument of a control event.
///
/// Each variant is representable as a string or a primitive understood
/// by both transports; the bus transport ships everything stringified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventArg {
    Str(String),
    Count(u64),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for EventArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventArg::Str(s) => write!(f, "{s}"),
            EventArg::Count(n) => write!(f, "{n}"),
            EventArg::Int(n) => write!(f, "{n}"),
            EventArg::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for EventArg {
    fn from(s: &str) -> Self {
        EventArg::Str(s.to_string())
    }
}

impl From<String> for EventArg {
    fn from(s: String) -> Self {
        EventArg::Str(s)
    }
}

impl From<u64> for EventArg {
    fn from(n: u64) -> Self {
        EventArg::Count(n)
    }
}

impl From<i64> for EventArg {
    fn from(n: i64) -> Self {
        EventArg::Int(n)
    }
}

impl From<bool> for EventArg {
    fn from(b: bool) -> Self {
        EventArg::Bool(b)
    }
}

/// A request to deliver one named control event to one node.
#[derive(Debug, Clone)]
pub struct EventRequest {
    /// Destination node. The receiver must subscribe to `event`.
    pub node: Node,
    /// Name of the event to send.
    pub event: String,
    /// Ordered event arguments.
    pub args: Vec<EventArg>,
    /// Name of the event the node sends back; `None` makes the request
    /// fire-and-forget.
    pub result_event: Option<String>,
}

impl EventRequest {
    pub fn new(
        node: Node,
        event: impl Into<String>,
        args: Vec<EventArg>,
        result_event: Option<String>,
    ) -> Self {
        Self {
            node,
            event: event.into(),
            args,
            result_event,
        }
    }
}

/// Outcome of delivering one control event.
///
/// On success the payload carries the reply event's arguments, empty if
/// no reply was requested. On failure it carries a short diagnostic.
/// The legacy transport resolves deferred replies after all sends, so
/// callers correlate results with requests by node name, not position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventResult {
    /// Name of the node this result belongs to.
    pub node: String,
    /// Reply arguments, or a diagnostic string.
    pub outcome: Result<Vec<String>, String>,
}

impl EventResult {
    pub fn success(node: &str, payload: Vec<String>) -> Self {
        Self {
            node: node.to_string(),
            outcome: Ok(payload),
        }
    }

    pub fn failure(node: &str, error: impl fmt::Display) -> Self {
        Self {
            node: node.to_string(),
            outcome: Err(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_stringify() {
        assert_eq!(EventArg::from("net_stats").to_string(), "net_stats");
        assert_eq!(EventArg::from(42u64).to_string(), "42");
        assert_eq!(EventArg::from(-7i64).to_string(), "-7");
        assert_eq!(EventArg::from(true).to_string(), "true");
    }

    #[test]
    fn failure_carries_diagnostic() {
        let result = EventResult::failure("worker-1", "time-out");
        assert!(!result.is_success());
        assert_eq!(result.outcome.unwrap_err(), "time-out");
    }
}
