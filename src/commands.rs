//! JSON bodies of the commands sent to a receiver.
//!
//! Each command type knows its namespace; the channel wraps the serialized
//! body in an envelope. Field order of the structs is the order on the wire.

use crate::error::Result;
use crate::proto::{AuthChallenge, DeviceAuthMessage};
use crate::protocol::{
    NAMESPACE_CONNECTION, NAMESPACE_HEARTBEAT, NAMESPACE_MEDIA, NAMESPACE_RECEIVER,
};
use crate::types::{MediaMetadata, MediaSessionId, RequestId};
use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::net::{IpAddr, SocketAddr};

/// Stream type announced for content served by the local HTTP server
pub const STREAM_TYPE_LIVE: &str = "LIVE";

/// `metadataType` of generic media
pub const METADATA_GENERIC: u8 = 0;
/// `metadataType` of music tracks
pub const METADATA_MUSIC_TRACK: u8 = 3;

/// A JSON command addressed to one namespace
pub trait CastCommand: Serialize {
    const NAMESPACE: &'static str;

    /// Serialize the command body
    fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Heartbeat messages, in both directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum HeartbeatMessage {
    Ping,
    Pong,
}

impl CastCommand for HeartbeatMessage {
    const NAMESPACE: &'static str = NAMESPACE_HEARTBEAT;
}

/// Virtual connection management
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum ConnectionMessage {
    Connect,
    Close,
}

impl CastCommand for ConnectionMessage {
    const NAMESPACE: &'static str = NAMESPACE_CONNECTION;
}

/// Commands for the receiver platform endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ReceiverRequest {
    GetStatus {
        request_id: RequestId,
    },
    Launch {
        app_id: String,
        request_id: RequestId,
    },
}

impl CastCommand for ReceiverRequest {
    const NAMESPACE: &'static str = NAMESPACE_RECEIVER;
}

/// Commands for the media player of a launched application
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum MediaRequest {
    GetStatus {
        request_id: RequestId,
    },
    Load {
        media: MediaInformation,
        autoplay: bool,
        request_id: RequestId,
    },
    Play {
        media_session_id: MediaSessionId,
        request_id: RequestId,
    },
    Pause {
        media_session_id: MediaSessionId,
        request_id: RequestId,
    },
    Stop {
        media_session_id: MediaSessionId,
        request_id: RequestId,
    },
    SetVolume {
        volume: Volume,
        media_session_id: MediaSessionId,
        request_id: RequestId,
    },
    Seek {
        current_time: Box<RawValue>,
        media_session_id: MediaSessionId,
        request_id: RequestId,
    },
}

impl CastCommand for MediaRequest {
    const NAMESPACE: &'static str = NAMESPACE_MEDIA;
}

/// Volume block of SET_VOLUME
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Volume {
    pub level: f64,
    pub muted: bool,
}

/// Media descriptor embedded in LOAD
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MediaInfoMetadata>,
    pub content_id: String,
    pub stream_type: &'static str,
    pub content_type: String,
}

/// Metadata block of the media descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfoMetadata {
    pub metadata_type: u8,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub url: String,
}

impl MediaInformation {
    /// Describe the stream served at `http://<local_ip>:<port>/stream`
    pub fn new(
        local_ip: IpAddr,
        port: u16,
        mime: &str,
        metadata: Option<&MediaMetadata>,
    ) -> Self {
        Self {
            metadata: metadata.and_then(|meta| MediaInfoMetadata::project(mime, meta)),
            content_id: stream_url(local_ip, port),
            stream_type: STREAM_TYPE_LIVE,
            content_type: mime.to_string(),
        }
    }
}

impl MediaInfoMetadata {
    /// Project caller metadata onto the receiver's metadata block
    ///
    /// Returns `None` when no title can be found, even through the
    /// now-playing fallbacks. Music fields are only kept for `audio*`
    /// content with an explicit title.
    pub fn project(mime: &str, meta: &MediaMetadata) -> Option<Self> {
        let music = mime.starts_with("audio") && meta.title.is_some();
        let title = meta
            .title
            .as_ref()
            .or(meta.now_playing.as_ref())
            .or(meta.stream_now_playing.as_ref())?
            .clone();

        let music_field = |value: &Option<String>| if music { value.clone() } else { None };

        let images = meta
            .artwork_url
            .iter()
            .filter(|url| url.starts_with("http"))
            .map(|url| Image { url: url.clone() })
            .collect();

        Some(Self {
            metadata_type: if music {
                METADATA_MUSIC_TRACK
            } else {
                METADATA_GENERIC
            },
            title,
            artist: music_field(&meta.artist),
            album: music_field(&meta.album),
            album_artist: music_field(&meta.album_artist),
            track_number: music_field(&meta.track_number),
            disc_number: music_field(&meta.disc_number),
            images,
        })
    }
}

/// URL under which the receiver fetches the stream from this host
pub fn stream_url(local_ip: IpAddr, port: u16) -> String {
    format!("http://{}/stream", SocketAddr::new(local_ip, port))
}

/// Binary body of the device-auth challenge
pub fn auth_challenge_payload() -> Vec<u8> {
    DeviceAuthMessage {
        challenge: Some(AuthChallenge::default()),
        response: None,
        error: None,
    }
    .encode_to_vec()
}
