//! Error types for the tether-connect crate

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Invalid target {0}: expected one of {targets}", targets = tether_proto::KNOWN_TARGETS.join(", "))]
    InvalidTarget(String),

    #[error("Host on port {port} did not become reachable within {timeout:?}")]
    StartupTimeout { port: u16, timeout: Duration },

    #[error("Host exited before becoming reachable on port {port}: {status}")]
    HostExited { port: u16, status: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("{class} has no method {method}")]
    NoSuchMethod { class: String, method: String },

    #[error("Unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply { expected: &'static str, got: String },

    #[error("Session is closed")]
    SessionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnectError {
    /// Whether the failure happened before a session could be established.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            ConnectError::InvalidTarget(_)
                | ConnectError::StartupTimeout { .. }
                | ConnectError::HostExited { .. }
        )
    }
}
