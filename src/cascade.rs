//! # Classification Cascade
//!
//! Runs the classification strategies in priority order and returns the
//! first definite answer. When nobody can decide, the track is assumed not
//! to be live.

use crate::catalog::MetadataCatalog;
use crate::strategy::{IsrcStrategy, RecordingStrategy, ReleaseStrategy, Strategy, Verdict};
use crate::track::TrackSnapshot;
use log::{debug, info, warn};

/// Ordered list of strategies sharing one catalog.
pub struct Cascade<C> {
    catalog: C,
    strategies: Vec<Box<dyn Strategy>>,
}

impl<C: MetadataCatalog> Cascade<C> {
    /// Cascade with the standard order: ISRC, release, recording.
    pub fn new(catalog: C) -> Self {
        Self::with_strategies(
            catalog,
            vec![
                Box::new(IsrcStrategy),
                Box::new(ReleaseStrategy),
                Box::new(RecordingStrategy),
            ],
        )
    }

    /// Cascade trying `strategies` in the given order.
    pub fn with_strategies(catalog: C, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { catalog, strategies }
    }

    /// Whether `track` is a live recording, `false` if undecidable.
    pub fn classify(&self, track: &TrackSnapshot) -> bool {
        for strategy in &self.strategies {
            debug!("Attempting {} search", strategy.name());
            match strategy.classify(track, &self.catalog) {
                Verdict::Live => {
                    info!("Live: true ({})", strategy.name());
                    return true;
                }
                Verdict::NotLive => {
                    info!("Live: false ({})", strategy.name());
                    return false;
                }
                Verdict::Undecidable(reason) => {
                    warn!("{reason}");
                    warn!("{} search gave no answer, falling back", strategy.name());
                }
            }
        }

        warn!("Giving up, assuming not live.");
        false
    }

    /// Verdict of every strategy, without short-circuiting.
    ///
    /// Used for diagnostics; the skip decision always goes through
    /// [`Cascade::classify`].
    pub fn explain(&self, track: &TrackSnapshot) -> Vec<(&'static str, Verdict)> {
        self.strategies
            .iter()
            .map(|s| (s.name(), s.classify(track, &self.catalog)))
            .collect()
    }
}
