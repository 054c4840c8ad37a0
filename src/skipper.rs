//! # Live Skipper
//!
//! The polling engine. Each [`LiveSkipper::check`] looks at what is playing
//! and decides, in this order:
//!
//! - same track as last poll, or nothing playing: do nothing
//! - track exempted earlier: keep it
//! - not classified as live: keep it
//! - saved in the listener's library: exempt it for good, keep it
//! - skipped within the last five skips: the listener went back to it on
//!   purpose, so exempt it for good and keep it
//! - otherwise skip it and remember the skip
//!
//! [`LiveSkipper::run_forever`] repeats this with a fixed delay until the
//! playback source reports that authorization is gone.

use crate::cascade::Cascade;
use crate::catalog::MetadataCatalog;
use crate::history::{ExceptionSet, RecentSkipHistory};
use crate::playback::{PlaybackError, PlaybackSource};
use crate::track::TrackSnapshot;
use log::{error, info};
use std::thread;
use std::time::Duration;

/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip,
    DoNotSkip,
}

/// Skip engine holding its collaborators and in-memory state.
pub struct LiveSkipper<P, C> {
    playback: P,
    cascade: Cascade<C>,
    exceptions: ExceptionSet,
    recent_skips: RecentSkipHistory,
    last_seen: Option<String>,
    poll_interval: Duration,
}

impl<P: PlaybackSource, C: MetadataCatalog> LiveSkipper<P, C> {
    pub fn new(playback: P, catalog: C) -> Self {
        Self::with_cascade(playback, Cascade::new(catalog))
    }

    pub fn with_cascade(playback: P, cascade: Cascade<C>) -> Self {
        Self {
            playback,
            cascade,
            exceptions: ExceptionSet::new(),
            recent_skips: RecentSkipHistory::new(),
            last_seen: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    pub fn exceptions(&self) -> &ExceptionSet {
        &self.exceptions
    }

    pub fn recent_skips(&self) -> &RecentSkipHistory {
        &self.recent_skips
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    /// Poll once and skip the current track if necessary.
    ///
    /// Returns whether a skip was issued.
    ///
    /// # Errors
    ///
    /// Any playback source failure. A failed skip command is not recorded
    /// in the skip history.
    pub fn check(&mut self) -> Result<bool, PlaybackError> {
        let Some(now_playing) = self.playback.currently_playing()? else {
            return Ok(false);
        };
        if !now_playing.is_playing {
            return Ok(false);
        }

        let decision = self.evaluate(&now_playing.track)?;
        Ok(decision == Decision::Skip)
    }

    /// Decide on a track that is playing right now.
    ///
    /// # Errors
    ///
    /// Failures of the favorites lookup or the skip command.
    pub fn evaluate(&mut self, track: &TrackSnapshot) -> Result<Decision, PlaybackError> {
        if self.last_seen.as_deref() == Some(track.id.as_str()) {
            return Ok(Decision::DoNotSkip);
        }

        info!("Now listening to {track}");
        self.last_seen = Some(track.id.clone());

        if self.exceptions.contains(&track.id) {
            return Ok(Decision::DoNotSkip);
        }

        if !self.cascade.classify(track) {
            return Ok(Decision::DoNotSkip);
        }

        if self.playback.is_favorited(&track.id)? {
            info!("Found in saved tracks.");
            self.add_exception(track);
            return Ok(Decision::DoNotSkip);
        }

        if self.recent_skips.contains(&track.id) {
            info!("Registered replay.");
            self.add_exception(track);
            return Ok(Decision::DoNotSkip);
        }

        info!("Skipping {track}");
        if let Err(e) = self.playback.skip_to_next() {
            error!("Skipping failed.");
            return Err(e);
        }
        self.recent_skips.push(&track.id);
        Ok(Decision::Skip)
    }

    fn add_exception(&mut self, track: &TrackSnapshot) {
        info!("Adding {track} to exceptions");
        self.exceptions.insert(&track.id);
    }

    /// Poll forever, sleeping the poll interval between cycles.
    ///
    /// Non-fatal errors are logged and the cycle is abandoned. Only returns
    /// on a fatal playback error.
    pub fn run_forever(&mut self) -> Result<(), PlaybackError> {
        info!("LiveSkipper active.");
        loop {
            if let Err(e) = self.check() {
                if e.is_fatal() {
                    error!("{e}. Exiting.");
                    return Err(e);
                }
                error!("Ignoring unexpected error: {e}");
            }
            thread::sleep(self.poll_interval);
        }
    }
}
