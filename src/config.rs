//! Channel configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// TLS control port of Cast receivers
pub const DEFAULT_PORT: u16 = 8009;

/// Sender identity used as `source_id` of every envelope
pub const DEFAULT_SOURCE_ID: &str = "sender-0";

/// Application id of the default media receiver
pub const DEFAULT_APP_ID: &str = "CC1AD845";

/// Channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Control port on the receiver.
    pub port: u16,

    /// Sender identity placed in outgoing envelopes.
    pub source_id: String,

    /// Application launched by LAUNCH.
    pub app_id: String,

    /// Limit for TCP connect and TLS handshake, each.
    #[serde(with = "millis")]
    pub connect_timeout: Duration,

    /// Accept the receiver's self-signed certificate.
    pub accept_invalid_certs: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            source_id: DEFAULT_SOURCE_ID.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            connect_timeout: Duration::from_secs(10),
            accept_invalid_certs: true,
        }
    }
}

impl ChannelConfig {
    /// Builder: set the control port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder: set the sender identity.
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    /// Builder: set the application id.
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Builder: set connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder: set certificate validation.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
