//! Rust library for driving Chromecast receivers over the CASTV2 control protocol
//!
//! This library provides the sender side of the Cast control channel:
//!
//! - TLS connection to the receiver's control port (8009 by default)
//! - Length-prefixed protobuf framing of channel envelopes
//! - Timed receive with partial-read handling for heartbeat-driven read loops
//! - Per-namespace request id sequencing
//! - Command bodies for the connection, heartbeat, receiver and media namespaces
//!
//! # Quick Start
//!
//! ```no_run
//! use castv2_sender::{CastChannel, MediaMetadata, DEFAULT_RECEIVER_ID};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut channel = CastChannel::connect("192.168.1.50", None).await?;
//!
//!     channel.send_connect(DEFAULT_RECEIVER_ID).await?;
//!     channel.launch_app().await?;
//!
//!     // The transport id of the launched application comes from the
//!     // RECEIVER_STATUS answer, parsed by the caller.
//!     let transport_id = "web-5";
//!     channel.send_connect(transport_id).await?;
//!
//!     let meta = MediaMetadata::with_title("Song").artist("Band");
//!     channel
//!         .load_media(transport_id, 8080, "audio/mpeg", Some(&meta))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Read Loop
//!
//! The receiver pings about every five seconds. Reading with
//! [`HEARTBEAT_TIMEOUT`] and feeding the outcome to a [`Heartbeat`] tells the
//! caller when to ping and when to give up:
//!
//! ```no_run
//! use castv2_sender::{
//!     CastChannel, Heartbeat, HeartbeatAction, HeartbeatMessage, HEARTBEAT_TIMEOUT,
//! };
//!
//! # async fn run(mut channel: CastChannel) -> castv2_sender::Result<()> {
//! let mut heartbeat = Heartbeat::new();
//! loop {
//!     match channel.receive_message(HEARTBEAT_TIMEOUT).await? {
//!         Some(envelope) => {
//!             heartbeat.on_message();
//!             if HeartbeatMessage::from_envelope(&envelope) == Some(HeartbeatMessage::Ping) {
//!                 channel.send_pong().await?;
//!             }
//!         }
//!         None => match heartbeat.on_timeout() {
//!             HeartbeatAction::SendPing => channel.send_ping().await?,
//!             HeartbeatAction::ConnectionLost => break,
//!         },
//!     }
//! }
//! channel.disconnect().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Client**: [`CastChannel`], one method per command plus receive primitives
//! - **Commands**: JSON bodies and the media descriptor of LOAD
//! - **Sequencer**: receiver and media request id counters
//! - **Protocol**: envelope type, namespaces and frame codec
//! - **Connection**: TLS transport with timed exact reads
//! - **Keepalive**: heartbeat miss detection for the caller's read loop

mod client;
mod commands;
mod config;
mod connection;
mod error;
mod keepalive;
pub mod proto;
mod protocol;
mod sequencer;
mod types;

// Public exports
pub use client::CastChannel;
pub use commands::{
    auth_challenge_payload, stream_url, CastCommand, ConnectionMessage, HeartbeatMessage, Image,
    MediaInfoMetadata, MediaInformation, MediaRequest, ReceiverRequest, Volume,
    METADATA_GENERIC, METADATA_MUSIC_TRACK, STREAM_TYPE_LIVE,
};
pub use config::{ChannelConfig, DEFAULT_APP_ID, DEFAULT_PORT, DEFAULT_SOURCE_ID};
pub use connection::{ReadOutcome, Transport};
pub use error::{CastError, Result, SetupError};
pub use keepalive::{Heartbeat, HeartbeatAction, HEARTBEAT_TIMEOUT};
pub use protocol::{
    decode_body, decode_frame, encode_frame, frame_body_len, Envelope, Payload,
    DEFAULT_RECEIVER_ID, FRAME_HEADER_LEN, MAX_FRAME_LEN, NAMESPACE_CONNECTION,
    NAMESPACE_DEVICE_AUTH, NAMESPACE_HEARTBEAT, NAMESPACE_MEDIA, NAMESPACE_RECEIVER,
};
pub use sequencer::RequestSequencer;
pub use types::{MediaMetadata, MediaSessionId, RequestId};
