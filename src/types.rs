use serde::{Deserialize, Serialize};

/// Request identifier correlating a command with its response
pub type RequestId = u64;

/// Media session identifier, taken from a LOAD response (never zero once valid)
pub type MediaSessionId = i64;

/// Descriptive metadata for the media handed to a LOAD command
///
/// All fields are optional; values are passed through as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub track_number: Option<String>,
    pub disc_number: Option<String>,

    /// Artwork location; only `http`/`https` URLs are forwarded
    #[serde(rename = "artworkURL")]
    pub artwork_url: Option<String>,

    /// Title of the currently playing item of a stream (first title fallback)
    pub now_playing: Option<String>,

    /// Title announced by the elementary stream itself (second title fallback)
    pub stream_now_playing: Option<String>,
}

impl MediaMetadata {
    /// Create metadata with only a title
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Set the artist
    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Set the album
    pub fn album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set the artwork URL
    pub fn artwork_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }
}
