//! # Playback Source
//!
//! The streaming service as seen by the skipper: what is playing, whether
//! the listener saved it, and a way to move on to the next track.

use crate::track::NowPlaying;
use thiserror::Error;

/// Errors reported by a playback source.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Delegated access is gone; nothing can proceed without it.
    #[error("authorization failed: {0}")]
    Unauthorized(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),
}

impl PlaybackError {
    /// Whether the polling loop must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Access to the listener's playback state.
///
/// Methods take `&mut self` because implementations refresh credentials
/// as they go.
pub trait PlaybackSource {
    /// The current item, or `None` if nothing (or nothing identifiable)
    /// is loaded.
    fn currently_playing(&mut self) -> Result<Option<NowPlaying>, PlaybackError>;

    /// Whether the track is saved in the listener's library.
    fn is_favorited(&mut self, track_id: &str) -> Result<bool, PlaybackError>;

    fn skip_to_next(&mut self) -> Result<(), PlaybackError>;
}
