//! # Classification Strategies
//!
//! Three independent ways of asking the metadata catalog whether a track is a
//! live recording, ordered from most to least reliable:
//!
//! 1. [`IsrcStrategy`] - exact lookup of the recording code
//! 2. [`ReleaseStrategy`] - vote among releases matching the album
//! 3. [`RecordingStrategy`] - vote among recordings matching the title
//!
//! Every strategy answers with a [`Verdict`]. Failing to decide is an
//! ordinary outcome, not an error, so catalog failures are folded into
//! [`Verdict::Undecidable`] here and never leave a strategy.

use crate::catalog::{credit_phrase, lead_artist, ArtistCredit, MetadataCatalog, Recording, Release};
use crate::dates::dates_fit;
use crate::track::TrackSnapshot;
use log::{debug, info};
use std::fmt;

/// Prefix the catalog uses for live-performance annotations.
const LIVE_PREFIX: &str = "live";

/// Outcome of a single classification strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Live,
    NotLive,
    /// No confident answer; carries the reason for the log.
    Undecidable(String),
}

impl Verdict {
    fn undecidable(reason: impl Into<String>) -> Self {
        Self::Undecidable(reason.into())
    }

    /// `Some(is_live)` for definite verdicts.
    pub fn decision(&self) -> Option<bool> {
        match self {
            Self::Live => Some(true),
            Self::NotLive => Some(false),
            Self::Undecidable(_) => None,
        }
    }
}

impl From<bool> for Verdict {
    fn from(is_live: bool) -> Self {
        if is_live {
            Self::Live
        } else {
            Self::NotLive
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::NotLive => write!(f, "not live"),
            Self::Undecidable(reason) => write!(f, "undecidable ({reason})"),
        }
    }
}

/// A way of deciding whether a track is live.
pub trait Strategy {
    /// Short label used in log lines, e.g. `"ISRC"`.
    fn name(&self) -> &'static str;

    fn classify(&self, track: &TrackSnapshot, catalog: &dyn MetadataCatalog) -> Verdict;
}

/// Whether `artist` matches a catalog credit.
///
/// The lowercased artist must equal either the lowercased lead credit name
/// or the full credit phrase. `fold_phrase` controls whether the phrase is
/// lowercased before comparing.
fn artist_fits(artist: &str, credits: &[ArtistCredit], fold_phrase: bool) -> bool {
    let artist = artist.to_lowercase();
    let phrase = credit_phrase(credits);
    let phrase = if fold_phrase { phrase.to_lowercase() } else { phrase };

    artist == lead_artist(credits).to_lowercase() || artist == phrase
}

/// Loose, case-insensitive containment in either direction.
fn titles_fit(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// `votes` out of `total` reach half. Ties count as a majority.
fn at_least_half(votes: usize, total: usize) -> bool {
    votes * 2 >= total
}

/// Whether a release is a plausible match for the track's album.
pub fn release_fits(release: &Release, track: &TrackSnapshot) -> bool {
    !track.album.trim().is_empty()
        && artist_fits(&track.artist, &release.artist_credit, false)
        && titles_fit(&release.title, &track.album)
        && dates_fit(release.date.as_deref().unwrap_or("0"), &track.release_date, true)
        && release.group_type().to_lowercase() != "compilation"
}

/// Whether a recording is a plausible match for the track.
pub fn recording_fits(recording: &Recording, track: &TrackSnapshot) -> bool {
    artist_fits(&track.artist, &recording.artist_credit, true)
        && titles_fit(&recording.title, &track.title)
}

/// Looks the track up by its ISRC.
#[derive(Debug, Default, Clone, Copy)]
pub struct IsrcStrategy;

impl Strategy for IsrcStrategy {
    fn name(&self) -> &'static str {
        "ISRC"
    }

    fn classify(&self, track: &TrackSnapshot, catalog: &dyn MetadataCatalog) -> Verdict {
        let Some(isrc) = track.isrc() else {
            return Verdict::undecidable("Track has no ISRC");
        };

        let recordings = match catalog.recordings_by_isrc(isrc) {
            Ok(recordings) => recordings,
            Err(e) => return Verdict::undecidable(format!("ISRC {isrc} not found ({e})")),
        };
        debug!("{} recordings share ISRC {isrc}", recordings.len());

        let annotations: Vec<&str> = recordings.iter().filter_map(Recording::annotation).collect();
        debug!("ISRC annotations: {annotations:?}");
        if annotations.is_empty() {
            return Verdict::undecidable("No info in ISRC results");
        }

        annotations.iter().any(|a| a.starts_with(LIVE_PREFIX)).into()
    }
}

/// Votes among the releases that match the track's album.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReleaseStrategy;

impl Strategy for ReleaseStrategy {
    fn name(&self) -> &'static str {
        "release"
    }

    fn classify(&self, track: &TrackSnapshot, catalog: &dyn MetadataCatalog) -> Verdict {
        if track.album.trim().is_empty() {
            return Verdict::undecidable("Track has no album");
        }

        let releases = match catalog.search_releases(&track.artist, &track.album) {
            Ok(releases) => releases,
            Err(e) => {
                return Verdict::undecidable(format!(
                    "Release {} - {} not found ({e})",
                    track.artist, track.album
                ))
            }
        };

        let fitting: Vec<&Release> = releases.iter().filter(|r| release_fits(r, track)).collect();
        debug!(
            "Fitting releases: {:?}",
            fitting.iter().map(|r| r.id.as_str()).collect::<Vec<_>>()
        );
        if fitting.is_empty() {
            return Verdict::undecidable("No fitting releases found");
        }

        let live_votes = fitting
            .iter()
            .filter(|r| r.group_type().eq_ignore_ascii_case("live"))
            .count();
        info!("{} releases, {live_votes} vote live.", fitting.len());

        at_least_half(live_votes, fitting.len()).into()
    }
}

/// Votes among the annotations of recordings that match the track.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordingStrategy;

impl Strategy for RecordingStrategy {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn classify(&self, track: &TrackSnapshot, catalog: &dyn MetadataCatalog) -> Verdict {
        let recordings = match catalog.search_recordings(&track.artist, &track.title) {
            Ok(recordings) => recordings,
            Err(e) => {
                return Verdict::undecidable(format!(
                    "Track {} - {} not found ({e})",
                    track.artist, track.title
                ))
            }
        };

        let fitting: Vec<&Recording> = recordings.iter().filter(|r| recording_fits(r, track)).collect();
        debug!(
            "Fitting recordings: {:?}",
            fitting.iter().map(|r| r.id.as_str()).collect::<Vec<_>>()
        );
        if fitting.is_empty() {
            return Verdict::undecidable("No fitting tracks found");
        }

        let annotations: Vec<&str> = fitting.iter().filter_map(|r| r.annotation()).collect();
        if annotations.is_empty() {
            return Verdict::undecidable("No info in tracks");
        }

        let live_votes = annotations.iter().filter(|a| a.starts_with(LIVE_PREFIX)).count();
        info!("{} tracks, {live_votes} vote live.", annotations.len());

        at_least_half(live_votes, annotations.len()).into()
    }
}
