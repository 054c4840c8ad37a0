//! Track snapshots as observed from the playback source.

use std::fmt;

/// Immutable description of the item currently playing.
///
/// A fresh snapshot is produced on every poll and only lives for one
/// evaluation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackSnapshot {
    /// Stable track identifier of the streaming service
    pub id: String,
    /// Primary artist, used for catalog queries
    pub artist: String,
    /// Artist shown in log lines
    pub display_artist: String,
    pub title: String,
    pub album: String,
    /// Album release date in whatever precision the service provides
    pub release_date: String,
    /// International Standard Recording Code, if the service knows it
    pub isrc: Option<String>,
}

impl TrackSnapshot {
    /// Builds a snapshot whose display artist is the primary artist.
    pub fn new(
        id: impl Into<String>,
        artist: impl Into<String>,
        title: impl Into<String>,
        album: impl Into<String>,
        release_date: impl Into<String>,
    ) -> Self {
        let artist = artist.into();
        Self {
            id: id.into(),
            display_artist: artist.clone(),
            artist,
            title: title.into(),
            album: album.into(),
            release_date: release_date.into(),
            isrc: None,
        }
    }

    #[must_use]
    pub fn with_isrc(mut self, isrc: impl Into<String>) -> Self {
        self.isrc = Some(isrc.into());
        self
    }

    /// The ISRC, if present and non-empty.
    pub fn isrc(&self) -> Option<&str> {
        self.isrc.as_deref().filter(|code| !code.is_empty())
    }
}

impl fmt::Display for TrackSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.display_artist, self.title)
    }
}

/// Result of polling the playback source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub is_playing: bool,
    pub track: TrackSnapshot,
}
