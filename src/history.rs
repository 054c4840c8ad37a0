//! In-memory bookkeeping of exempted and recently skipped tracks.
//!
//! Nothing here outlives the process.

use std::collections::{HashSet, VecDeque};

/// Number of recent skips remembered for replay detection.
pub const RECENT_SKIP_CAPACITY: usize = 5;

/// Tracks that must never be skipped again.
///
/// Grows for the lifetime of the process; there is no eviction.
#[derive(Debug, Default, Clone)]
pub struct ExceptionSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl ExceptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `track_id`, returning `false` if it was already exempted.
    pub fn insert(&mut self, track_id: &str) -> bool {
        if !self.members.insert(track_id.to_string()) {
            return false;
        }
        self.order.push(track_id.to_string());
        true
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.members.contains(track_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Exempted ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Most-recent-first window of skipped tracks with a fixed capacity.
#[derive(Debug, Clone)]
pub struct RecentSkipHistory {
    skips: VecDeque<String>,
    capacity: usize,
}

impl Default for RecentSkipHistory {
    fn default() -> Self {
        Self::with_capacity(RECENT_SKIP_CAPACITY)
    }
}

impl RecentSkipHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            skips: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Records a skip, evicting the oldest entry when full.
    pub fn push(&mut self, track_id: &str) {
        self.skips.push_front(track_id.to_string());
        self.skips.truncate(self.capacity);
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.skips.iter().any(|id| id == track_id)
    }

    pub fn len(&self) -> usize {
        self.skips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skips.is_empty()
    }

    /// Skipped ids, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.skips.iter().map(String::as_str)
    }
}
