use crate::commands::HeartbeatMessage;
use crate::protocol::{Envelope, NAMESPACE_HEARTBEAT};
use std::time::Duration;

/// Read window after which a silent receiver is pinged
///
/// Receivers send a PING roughly every five seconds.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(6);

/// What the read loop should do after a silent read window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Send a PING to provoke traffic
    SendPing,
    /// A PING went unanswered for a whole window; treat the channel as dead
    ConnectionLost,
}

/// Liveness tracking driven by the timed receive loop
///
/// Feed it every outcome of a receive bounded by [`HEARTBEAT_TIMEOUT`]:
/// any complete message resets it, a first silent window asks for a PING,
/// and a second silent window reports the connection lost.
#[derive(Debug, Default)]
pub struct Heartbeat {
    ping_outstanding: bool,
}

impl Heartbeat {
    /// Create a monitor with no PING outstanding
    pub fn new() -> Self {
        Self::default()
    }

    /// A message arrived from the receiver
    pub fn on_message(&mut self) {
        self.ping_outstanding = false;
    }

    /// The read window elapsed without a complete message
    pub fn on_timeout(&mut self) -> HeartbeatAction {
        if self.ping_outstanding {
            HeartbeatAction::ConnectionLost
        } else {
            self.ping_outstanding = true;
            HeartbeatAction::SendPing
        }
    }

    /// Whether a PING is waiting for an answer
    pub fn ping_outstanding(&self) -> bool {
        self.ping_outstanding
    }
}

impl HeartbeatMessage {
    /// Recognize a heartbeat message; other namespaces yield `None`
    pub fn from_envelope(envelope: &Envelope) -> Option<Self> {
        if envelope.namespace != NAMESPACE_HEARTBEAT {
            return None;
        }
        serde_json::from_str(envelope.payload_utf8()?).ok()
    }
}
