use crate::config::{ChannelConfig, DEFAULT_PORT};
use crate::error::{CastError, Result, SetupError};
use std::io::ErrorKind;
use std::net::IpAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_native_tls::{native_tls, TlsStream};

/// Result of a timed read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes placed at the start of the caller's buffer
    pub bytes_read: usize,
    /// The deadline passed before the buffer was filled
    pub timed_out: bool,
}

/// Low-level byte transport to a receiver
///
/// Owns the stream until [`Transport::disconnect`] is called. Reads and
/// writes take `&mut self`; callers sharing a transport between tasks must
/// wrap it in a mutex.
pub struct Transport<S> {
    stream: Option<S>,
    local_ip: IpAddr,
}

impl Transport<TlsStream<TcpStream>> {
    /// Open a TLS connection to `host:port`
    ///
    /// The local address of the socket is captured for building URLs the
    /// receiver can reach back to. Any failure drops what was opened so far.
    /// Port `0` selects [`DEFAULT_PORT`].
    pub async fn connect(host: &str, port: u16, config: &ChannelConfig) -> Result<Self> {
        let port = if port == 0 { DEFAULT_PORT } else { port };
        let address = format!("{}:{}", host, port);
        tracing::info!("Connecting to {}", address);

        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .danger_accept_invalid_hostnames(config.accept_invalid_certs)
            .build()
            .map_err(SetupError::Credentials)?;
        let connector = tokio_native_tls::TlsConnector::from(connector);

        let tcp = timeout(config.connect_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| SetupError::Timeout(address.clone()))?
            .map_err(|source| SetupError::Connect {
                address: address.clone(),
                source,
            })?;

        let local_ip = tcp
            .local_addr()
            .map_err(SetupError::LocalAddress)?
            .ip();

        let tls = timeout(config.connect_timeout, connector.connect(host, tcp))
            .await
            .map_err(|_| SetupError::Timeout(address.clone()))?
            .map_err(SetupError::Handshake)?;

        tracing::info!("Connected to {} from {}", address, local_ip);
        Ok(Self::from_stream(tls, local_ip))
    }
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already established stream
    pub fn from_stream(stream: S, local_ip: IpAddr) -> Self {
        Self {
            stream: Some(stream),
            local_ip,
        }
    }

    /// Local IP address of the connection
    pub fn local_ip(&self) -> IpAddr {
        self.local_ip
    }

    /// Whether the stream is still open
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Write all bytes to the receiver
    pub async fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(CastError::NotConnected)?;
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok(bytes.len())
    }

    /// Fill `buf` from the stream, waiting at most `wait`
    ///
    /// Partial reads are accumulated until the buffer is full. When the
    /// deadline passes first, the bytes received so far are reported with
    /// `timed_out` set; that is not an error. A zero-byte read means the
    /// peer closed the connection.
    pub async fn read_exact(&mut self, buf: &mut [u8], wait: Duration) -> Result<ReadOutcome> {
        let stream = self.stream.as_mut().ok_or(CastError::NotConnected)?;
        let deadline = Instant::now() + wait;
        let mut received = 0;

        while received < buf.len() {
            match timeout_at(deadline, stream.read(&mut buf[received..])).await {
                Err(_) => {
                    return Ok(ReadOutcome {
                        bytes_read: received,
                        timed_out: true,
                    });
                }
                Ok(Ok(0)) => return Err(CastError::ConnectionClosed),
                Ok(Ok(n)) => received += n,
                Ok(Err(e)) if e.kind() == ErrorKind::Interrupted => continue,
                Ok(Err(e)) => return Err(e.into()),
            }
        }

        Ok(ReadOutcome {
            bytes_read: received,
            timed_out: false,
        })
    }

    /// Close the stream; later calls are no-ops
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!("Shutdown after disconnect failed: {}", e);
            }
            tracing::info!("Disconnected");
        }
    }
}
