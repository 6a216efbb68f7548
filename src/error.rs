use thiserror::Error;

/// Result type for Cast channel operations
pub type Result<T> = std::result::Result<T, CastError>;

/// Errors that can occur when talking to a Cast receiver
#[derive(Error, Debug)]
pub enum CastError {
    /// The channel could not be established
    #[error("Connection setup failed: {0}")]
    Setup(#[from] SetupError),

    /// I/O error on an established connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The receiver closed the connection
    #[error("Connection closed")]
    ConnectionClosed,

    /// The channel was already disconnected
    #[error("Not connected")]
    NotConnected,

    /// JSON serialization error while building a command
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Envelope serialization error
    #[error("Encode error: {0}")]
    Encode(#[from] prost::EncodeError),

    /// Envelope deserialization error
    #[error("Decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Frame body exceeds the receiver's message size limit
    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// A decoded envelope is structurally invalid
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),
}

/// Failures while opening the TLS channel to a receiver
#[derive(Error, Debug)]
pub enum SetupError {
    /// The TLS connector (client credentials) could not be created
    #[error("TLS client creation failed: {0}")]
    Credentials(#[source] tokio_native_tls::native_tls::Error),

    /// TCP connection to the receiver failed
    #[error("Cannot reach {address}: {source}")]
    Connect {
        /// Target host and port
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// TCP connection or TLS handshake did not finish in time
    #[error("Timed out connecting to {0}")]
    Timeout(String),

    /// TLS handshake failed
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] tokio_native_tls::native_tls::Error),

    /// The local socket address could not be determined
    #[error("Cannot get local IP address: {0}")]
    LocalAddress(#[source] std::io::Error),
}
