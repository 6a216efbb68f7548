use crate::commands::{
    auth_challenge_payload, CastCommand, ConnectionMessage, HeartbeatMessage, MediaInformation,
    MediaRequest, ReceiverRequest, Volume,
};
use crate::config::{ChannelConfig, DEFAULT_PORT};
use crate::connection::{ReadOutcome, Transport};
use crate::error::Result;
use crate::protocol::{
    decode_body, encode_frame, frame_body_len, Envelope, Payload, DEFAULT_RECEIVER_ID,
    FRAME_HEADER_LEN, NAMESPACE_DEVICE_AUTH,
};
use crate::sequencer::RequestSequencer;
use crate::types::{MediaMetadata, MediaSessionId};
use serde_json::value::RawValue;
use std::net::IpAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_native_tls::TlsStream;

/// Control channel to a Cast receiver
///
/// One method per protocol command, plus timed receive primitives for the
/// caller's read loop. The channel does no internal locking: methods take
/// `&mut self`, so sharing one channel between tasks needs a mutex around it.
/// Inbound payloads other than the envelope itself are left to the caller.
pub struct CastChannel<S = TlsStream<TcpStream>> {
    transport: Transport<S>,
    sequencer: RequestSequencer,
    config: ChannelConfig,
    /// Partially received frame, header included
    inbound: Vec<u8>,
    inbound_filled: usize,
}

impl CastChannel {
    /// Connect to a receiver at the given host
    ///
    /// `None` (or `0`) selects the default control port 8009.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use castv2_sender::CastChannel;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let mut channel = CastChannel::connect("192.168.1.50", None).await?;
    ///     channel.send_connect("receiver-0").await?;
    ///     channel.launch_app().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(host: &str, port: Option<u16>) -> Result<Self> {
        let config = ChannelConfig::default().with_port(port.unwrap_or(DEFAULT_PORT));
        Self::connect_with_config(host, config).await
    }

    /// Connect using an explicit configuration
    ///
    /// A configured port of `0` selects the default control port.
    pub async fn connect_with_config(host: &str, config: ChannelConfig) -> Result<Self> {
        let transport = Transport::connect(host, config.port, &config).await?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<S> CastChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Build a channel over an already established stream
    pub fn from_stream(stream: S, local_ip: IpAddr, config: ChannelConfig) -> Self {
        Self::with_transport(Transport::from_stream(stream, local_ip), config)
    }

    fn with_transport(transport: Transport<S>, config: ChannelConfig) -> Self {
        Self {
            transport,
            sequencer: RequestSequencer::new(),
            config,
            inbound: Vec::new(),
            inbound_filled: 0,
        }
    }

    /// Local IP address the receiver can reach this host on
    pub fn local_ip(&self) -> IpAddr {
        self.transport.local_ip()
    }

    /// Request id counters
    pub fn sequencer(&self) -> &RequestSequencer {
        &self.sequencer
    }

    /// Active configuration
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Whether the channel is still open
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Close the connection; safe to call repeatedly
    pub async fn disconnect(&mut self) {
        self.transport.disconnect().await;
    }

    /// Frame and write one envelope
    pub async fn send_envelope(&mut self, envelope: Envelope) -> Result<()> {
        let frame = encode_frame(&envelope)?;
        tracing::debug!(
            "Sending: {} -> {} {}",
            envelope.namespace,
            envelope.destination_id,
            envelope.payload_utf8().unwrap_or("<binary>")
        );

        if let Err(e) = self.transport.write(&frame).await {
            tracing::warn!("Failed to send message on {}: {}", envelope.namespace, e);
            return Err(e);
        }
        Ok(())
    }

    async fn send_command<C: CastCommand>(
        &mut self,
        destination_id: &str,
        command: &C,
    ) -> Result<()> {
        let payload = command.to_payload()?;
        let envelope = Envelope::new(
            C::NAMESPACE,
            &self.config.source_id,
            destination_id,
            Payload::Utf8(payload),
        );
        self.send_envelope(envelope).await
    }

    /// Send the device-auth challenge
    pub async fn send_auth_challenge(&mut self) -> Result<()> {
        let envelope = Envelope::new(
            NAMESPACE_DEVICE_AUTH,
            &self.config.source_id,
            DEFAULT_RECEIVER_ID,
            Payload::Binary(auth_challenge_payload()),
        );
        self.send_envelope(envelope).await
    }

    /// Send a heartbeat PING
    pub async fn send_ping(&mut self) -> Result<()> {
        self.send_command(DEFAULT_RECEIVER_ID, &HeartbeatMessage::Ping).await
    }

    /// Answer a receiver PING
    pub async fn send_pong(&mut self) -> Result<()> {
        self.send_command(DEFAULT_RECEIVER_ID, &HeartbeatMessage::Pong).await
    }

    /// Open a virtual connection to `destination_id`
    pub async fn send_connect(&mut self, destination_id: &str) -> Result<()> {
        self.send_command(destination_id, &ConnectionMessage::Connect).await
    }

    /// Close the virtual connection to `destination_id`
    pub async fn send_close(&mut self, destination_id: &str) -> Result<()> {
        self.send_command(destination_id, &ConnectionMessage::Close).await
    }

    /// Ask the receiver for its status
    pub async fn request_receiver_status(&mut self) -> Result<()> {
        let request = ReceiverRequest::GetStatus {
            request_id: self.sequencer.next_receiver_id(),
        };
        self.send_command(DEFAULT_RECEIVER_ID, &request).await
    }

    /// Launch the configured application
    pub async fn launch_app(&mut self) -> Result<()> {
        let request = ReceiverRequest::Launch {
            app_id: self.config.app_id.clone(),
            request_id: self.sequencer.next_receiver_id(),
        };
        self.send_command(DEFAULT_RECEIVER_ID, &request).await
    }

    /// Ask the media player of `destination_id` for its status
    ///
    /// # Panics
    ///
    /// Panics if `destination_id` is empty.
    pub async fn request_media_status(&mut self, destination_id: &str) -> Result<()> {
        check_destination(destination_id);
        let request = MediaRequest::GetStatus {
            request_id: self.sequencer.next_media_id(),
        };
        self.send_command(destination_id, &request).await
    }

    /// Load the stream served on `port` of this host, paused
    ///
    /// # Panics
    ///
    /// Panics if `destination_id` is empty.
    pub async fn load_media(
        &mut self,
        destination_id: &str,
        port: u16,
        mime: &str,
        metadata: Option<&MediaMetadata>,
    ) -> Result<()> {
        check_destination(destination_id);
        let media = MediaInformation::new(self.local_ip(), port, mime, metadata);
        tracing::debug!("Stream URL: {}", media.content_id);

        let request = MediaRequest::Load {
            media,
            autoplay: false,
            request_id: self.sequencer.next_media_id(),
        };
        self.send_command(destination_id, &request).await
    }

    /// Resume playback
    ///
    /// # Panics
    ///
    /// Panics if `destination_id` is empty or `media_session_id` is zero.
    pub async fn play(
        &mut self,
        destination_id: &str,
        media_session_id: MediaSessionId,
    ) -> Result<()> {
        check_media_session(destination_id, media_session_id);
        let request = MediaRequest::Play {
            media_session_id,
            request_id: self.sequencer.next_media_id(),
        };
        self.send_command(destination_id, &request).await
    }

    /// Pause playback
    ///
    /// # Panics
    ///
    /// Panics if `destination_id` is empty or `media_session_id` is zero.
    pub async fn pause(
        &mut self,
        destination_id: &str,
        media_session_id: MediaSessionId,
    ) -> Result<()> {
        check_media_session(destination_id, media_session_id);
        let request = MediaRequest::Pause {
            media_session_id,
            request_id: self.sequencer.next_media_id(),
        };
        self.send_command(destination_id, &request).await
    }

    /// Stop playback
    ///
    /// # Panics
    ///
    /// Panics if `destination_id` is empty or `media_session_id` is zero.
    pub async fn stop(
        &mut self,
        destination_id: &str,
        media_session_id: MediaSessionId,
    ) -> Result<()> {
        check_media_session(destination_id, media_session_id);
        let request = MediaRequest::Stop {
            media_session_id,
            request_id: self.sequencer.next_media_id(),
        };
        self.send_command(destination_id, &request).await
    }

    /// Set the stream volume
    ///
    /// A `level` outside `0.0..=1.0` sends nothing and consumes no request id.
    ///
    /// # Panics
    ///
    /// Panics if `destination_id` is empty or `media_session_id` is zero.
    pub async fn set_volume(
        &mut self,
        destination_id: &str,
        media_session_id: MediaSessionId,
        level: f64,
        muted: bool,
    ) -> Result<()> {
        check_media_session(destination_id, media_session_id);
        if !(0.0..=1.0).contains(&level) {
            tracing::debug!("Ignoring out of range volume {}", level);
            return Ok(());
        }

        let request = MediaRequest::SetVolume {
            volume: Volume { level, muted },
            media_session_id,
            request_id: self.sequencer.next_media_id(),
        };
        self.send_command(destination_id, &request).await
    }

    /// Seek to `current_time`, a JSON number of seconds such as `"42.5"`
    ///
    /// The value is embedded as given. Anything that is not valid JSON is
    /// rejected before a request id is taken.
    ///
    /// # Panics
    ///
    /// Panics if `destination_id` is empty or `media_session_id` is zero.
    pub async fn seek(
        &mut self,
        destination_id: &str,
        media_session_id: MediaSessionId,
        current_time: &str,
    ) -> Result<()> {
        check_media_session(destination_id, media_session_id);
        let current_time = RawValue::from_string(current_time.to_string())?;

        let request = MediaRequest::Seek {
            current_time,
            media_session_id,
            request_id: self.sequencer.next_media_id(),
        };
        self.send_command(destination_id, &request).await
    }

    /// Read up to `buf.len()` bytes, waiting at most `wait`
    ///
    /// Running out of time is reported through [`ReadOutcome::timed_out`],
    /// not as an error.
    pub async fn receive(&mut self, buf: &mut [u8], wait: Duration) -> Result<ReadOutcome> {
        self.transport.read_exact(buf, wait).await
    }

    /// Receive one complete message, waiting at most `wait`
    ///
    /// Returns `Ok(None)` when the time runs out first. Bytes of a frame
    /// that was only partly received are kept and completed by the next
    /// call. After an error the stream position is unknown and the channel
    /// should be dropped.
    pub async fn receive_message(&mut self, wait: Duration) -> Result<Option<Envelope>> {
        let deadline = Instant::now() + wait;

        if self.inbound_filled < FRAME_HEADER_LEN {
            self.inbound.resize(FRAME_HEADER_LEN, 0);
            if !self.fill_inbound(deadline).await? {
                return Ok(None);
            }

            let mut header = [0u8; FRAME_HEADER_LEN];
            header.copy_from_slice(&self.inbound[..FRAME_HEADER_LEN]);
            let body_len = match frame_body_len(header) {
                Ok(len) => len,
                Err(e) => {
                    self.reset_inbound();
                    return Err(e);
                }
            };
            self.inbound.resize(FRAME_HEADER_LEN + body_len, 0);
        }

        if !self.fill_inbound(deadline).await? {
            return Ok(None);
        }

        let envelope = decode_body(&self.inbound[FRAME_HEADER_LEN..]);
        self.reset_inbound();
        envelope.map(Some)
    }

    /// Read until the inbound buffer is full; false on timeout
    async fn fill_inbound(&mut self, deadline: Instant) -> Result<bool> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let outcome = self
            .transport
            .read_exact(&mut self.inbound[self.inbound_filled..], remaining)
            .await?;
        self.inbound_filled += outcome.bytes_read;
        Ok(!outcome.timed_out)
    }

    fn reset_inbound(&mut self) {
        self.inbound.clear();
        self.inbound_filled = 0;
    }
}

fn check_destination(destination_id: &str) {
    assert!(!destination_id.is_empty(), "media command without destination id");
}

fn check_media_session(destination_id: &str, media_session_id: MediaSessionId) {
    check_destination(destination_id);
    assert_ne!(media_session_id, 0, "media command before a media session was loaded");
}
