//! Per-node dispatch failure taxonomy.

use thiserror::Error;

/// Why delivery to one node failed.
///
/// These never propagate out of the dispatcher; each becomes the
/// diagnostic payload of that node's failed [`EventResult`]. Retry is
/// left to the caller.
///
/// [`EventResult`]: crate::event::EventResult
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The active transport's client library could not be loaded in
    /// this process.
    #[error("bindings not installed")]
    BindingsUnavailable,

    /// Endpoint unreachable or handshake error at connect time. Carries
    /// the underlying error text verbatim.
    #[error("{0}")]
    ConnectionFailed(String),

    /// Peer link requested but never confirmed by the connection-status
    /// check (bus transport only).
    #[error("no connection could be established")]
    PeeringFailed,

    /// Wait budget exhausted while draining outbound work or awaiting a
    /// reply (legacy transport).
    #[error("time-out")]
    Timeout,

    /// Polling window elapsed without any reply message (bus transport
    /// only).
    #[error("no response obtained")]
    NoResponse,
}
