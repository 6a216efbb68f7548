use crate::error::{CastError, Result};
use crate::proto::{CastMessage, PayloadType, ProtocolVersion};
use prost::Message;

/// Namespace of the device authentication challenge
pub const NAMESPACE_DEVICE_AUTH: &str = "urn:x-cast:com.google.cast.tp.deviceauth";
/// Namespace of PING/PONG keepalive messages
pub const NAMESPACE_HEARTBEAT: &str = "urn:x-cast:com.google.cast.tp.heartbeat";
/// Namespace of virtual connection management
pub const NAMESPACE_CONNECTION: &str = "urn:x-cast:com.google.cast.tp.connection";
/// Namespace of the receiver control endpoint
pub const NAMESPACE_RECEIVER: &str = "urn:x-cast:com.google.cast.receiver";
/// Namespace of the media player
pub const NAMESPACE_MEDIA: &str = "urn:x-cast:com.google.cast.media";

/// Destination id of the receiver's platform endpoint
pub const DEFAULT_RECEIVER_ID: &str = "receiver-0";

/// Size of the big-endian length prefix in front of every frame
pub const FRAME_HEADER_LEN: usize = 4;

/// Largest frame body a receiver accepts
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Envelope payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text, normally a JSON document
    Utf8(String),
    /// Raw bytes, used by the device-auth namespace
    Binary(Vec<u8>),
}

/// A message exchanged with the receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub namespace: String,
    pub source_id: String,
    pub destination_id: String,
    pub payload: Payload,
}

impl Envelope {
    /// Create a new envelope
    pub fn new(
        namespace: impl Into<String>,
        source_id: impl Into<String>,
        destination_id: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            source_id: source_id.into(),
            destination_id: destination_id.into(),
            payload,
        }
    }

    /// Get the text payload, if this is a string message
    pub fn payload_utf8(&self) -> Option<&str> {
        match &self.payload {
            Payload::Utf8(text) => Some(text),
            Payload::Binary(_) => None,
        }
    }
}

impl From<Envelope> for CastMessage {
    fn from(envelope: Envelope) -> Self {
        let (payload_type, payload_utf8, payload_binary) = match envelope.payload {
            Payload::Utf8(text) => (PayloadType::String, Some(text), None),
            Payload::Binary(bytes) => (PayloadType::Binary, None, Some(bytes)),
        };

        Self {
            protocol_version: ProtocolVersion::Castv210.into(),
            source_id: envelope.source_id,
            destination_id: envelope.destination_id,
            namespace: envelope.namespace,
            payload_type: payload_type.into(),
            payload_utf8,
            payload_binary,
        }
    }
}

impl TryFrom<CastMessage> for Envelope {
    type Error = CastError;

    fn try_from(msg: CastMessage) -> Result<Self> {
        let payload_type = PayloadType::try_from(msg.payload_type).map_err(|_| {
            CastError::InvalidEnvelope(format!("unknown payload type {}", msg.payload_type))
        })?;

        let payload = match (payload_type, msg.payload_utf8, msg.payload_binary) {
            (PayloadType::String, Some(text), _) => Payload::Utf8(text),
            (PayloadType::Binary, _, Some(bytes)) => Payload::Binary(bytes),
            (payload_type, _, _) => {
                return Err(CastError::InvalidEnvelope(format!(
                    "payload missing for type {:?}",
                    payload_type
                )));
            }
        };

        Ok(Self {
            namespace: msg.namespace,
            source_id: msg.source_id,
            destination_id: msg.destination_id,
            payload,
        })
    }
}

/// Serialize an envelope into a length-prefixed frame
pub fn encode_frame(envelope: &Envelope) -> Result<Vec<u8>> {
    let msg = CastMessage::from(envelope.clone());
    let body_len = msg.encoded_len();
    if body_len > MAX_FRAME_LEN {
        return Err(CastError::FrameTooLarge(body_len));
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body_len);
    frame.extend_from_slice(&(body_len as u32).to_be_bytes());
    msg.encode(&mut frame)?;
    Ok(frame)
}

/// Read the body length out of a frame header
pub fn frame_body_len(header: [u8; FRAME_HEADER_LEN]) -> Result<usize> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(CastError::FrameTooLarge(len));
    }
    Ok(len)
}

/// Deserialize a frame body (without its length prefix)
pub fn decode_body(body: &[u8]) -> Result<Envelope> {
    CastMessage::decode(body)?.try_into()
}

/// Deserialize one complete length-prefixed frame
pub fn decode_frame(frame: &[u8]) -> Result<Envelope> {
    let header: [u8; FRAME_HEADER_LEN] = frame
        .get(..FRAME_HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or_else(|| CastError::InvalidEnvelope("truncated frame header".to_string()))?;
    let body_len = frame_body_len(header)?;

    let body = &frame[FRAME_HEADER_LEN..];
    if body.len() != body_len {
        return Err(CastError::InvalidEnvelope(format!(
            "frame declares {} bytes but carries {}",
            body_len,
            body.len()
        )));
    }
    decode_body(body)
}
