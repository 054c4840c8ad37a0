//! Automatically skip live versions of songs on Spotify.
//!
//! Core modules:
//! - [`skipper`] - Poll cycle and skip decisions
//! - [`cascade`] - Ordered live classification
//! - [`strategy`] - ISRC, release and recording strategies
//! - [`history`] - Exception set and recent skip history
//! - [`dates`] - Loose date comparison
//!
//! ### Supporting Modules
//!
//! - [`track`] - Track snapshots
//! - [`playback`] / [`spotify`] / [`auth`] - Playback source and the Spotify Web API
//! - [`catalog`] / [`musicbrainz`] - Metadata catalog and the MusicBrainz web service
//! - [`config`] - Settings and data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use liveskipper::cascade::Cascade;
//! use liveskipper::musicbrainz::MusicBrainzClient;
//! use liveskipper::track::TrackSnapshot;
//!
//! let cascade = Cascade::new(MusicBrainzClient::new("you@example.com")?);
//! let track = TrackSnapshot::new(
//!     "6YffUZJ2R06kyxyK6onezL",
//!     "Johnny Cash",
//!     "Folsom Prison Blues - Live",
//!     "At Folsom Prison",
//!     "1968-05-01",
//! );
//! println!("live: {}", cascade.classify(&track));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## How a track is judged
//!
//! Each poll looks at the track currently playing. A track already seen in
//! the previous poll is ignored. Otherwise the strategies run in order and
//! the first one able to decide wins:
//!
//! 1. **ISRC**: every recording sharing the track's ISRC; live if any
//!    of them is annotated as live.
//! 2. **Release**: releases matching artist, album title and year; live if
//!    at least half of them belong to a live release group.
//! 3. **Recording**: recordings matching artist and title; live if at least
//!    half of the annotated ones are annotated as live.
//!
//! When no strategy decides, the track is assumed not live.
//!
//! A live track is left alone when it is in the listener's saved tracks or
//! when it comes back within the last five skips; either way it joins an
//! exception set for the rest of the session.
//!
//! ## Error Handling
//!
//! The trait seams return typed errors ([`catalog::CatalogError`],
//! [`playback::PlaybackError`]); the binary wraps everything in
//! `anyhow::Error`. Only an authorization failure stops the poll loop.

pub mod auth;
pub mod cascade;
pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod dates;
pub mod history;
pub mod musicbrainz;
pub mod playback;
pub mod skipper;
pub mod spotify;
pub mod strategy;
pub mod track;
