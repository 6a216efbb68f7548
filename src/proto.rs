//! Protocol buffer messages of the Cast channel.
//!
//! Field numbers and wire types are fixed by the receiver firmware
//! (`cast_channel.proto`, proto2 syntax).

/// Message exchanged with the receiver on the wire
#[derive(Clone, PartialEq, prost::Message)]
pub struct CastMessage {
    #[prost(enumeration = "ProtocolVersion", required, tag = "1")]
    pub protocol_version: i32,
    #[prost(string, required, tag = "2")]
    pub source_id: String,
    #[prost(string, required, tag = "3")]
    pub destination_id: String,
    #[prost(string, required, tag = "4")]
    pub namespace: String,
    #[prost(enumeration = "PayloadType", required, tag = "5")]
    pub payload_type: i32,
    #[prost(string, optional, tag = "6")]
    pub payload_utf8: Option<String>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub payload_binary: Option<Vec<u8>>,
}

/// Channel protocol revision; receivers only speak 1.0
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtocolVersion {
    Castv210 = 0,
}

/// Which payload field of [`CastMessage`] is populated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum PayloadType {
    String = 0,
    Binary = 1,
}

/// Payload of the device-auth namespace
#[derive(Clone, PartialEq, prost::Message)]
pub struct DeviceAuthMessage {
    #[prost(message, optional, tag = "1")]
    pub challenge: Option<AuthChallenge>,
    #[prost(message, optional, tag = "2")]
    pub response: Option<AuthResponse>,
    #[prost(message, optional, tag = "3")]
    pub error: Option<AuthError>,
}

/// Challenge sent by the sender; empty unless a nonce is supplied
#[derive(Clone, PartialEq, prost::Message)]
pub struct AuthChallenge {
    #[prost(bytes = "vec", optional, tag = "2")]
    pub sender_nonce: Option<Vec<u8>>,
}

/// Receiver's signed answer to a challenge
#[derive(Clone, PartialEq, prost::Message)]
pub struct AuthResponse {
    #[prost(bytes = "vec", required, tag = "1")]
    pub signature: Vec<u8>,
    #[prost(bytes = "vec", required, tag = "2")]
    pub client_auth_certificate: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub intermediate_certificate: Vec<Vec<u8>>,
}

/// Receiver's refusal of a challenge
#[derive(Clone, PartialEq, prost::Message)]
pub struct AuthError {
    #[prost(int32, required, tag = "1")]
    pub error_type: i32,
}
