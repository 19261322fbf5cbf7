use std::time::Duration;
use thiserror::Error;

/// Failures of a single connection. None of these are fatal to the channel:
/// each one ends the current connection and hands over to the reconnect policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("no frame received for {0:?}")]
    Stale(Duration),
}
