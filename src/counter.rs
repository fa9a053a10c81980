//! Directional line-crossing counter.
//!
//! Keeps the last centroid y-coordinate seen for every track id and classifies
//! each new sample against a horizontal reference line. Image coordinates grow
//! downward, so moving from above the line to on/below it is an exit and moving
//! from below the line to on/above it is an entry.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

/// Outcome of a single [`CrossingCounter::observe`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CrossingEvent {
    /// No crossing, including the first sample of a track.
    #[default]
    None,
    /// Upward crossing (from below the line to on or above it).
    Entry,
    /// Downward crossing (from above the line to on or below it).
    Exit,
}

impl CrossingEvent {
    pub fn is_crossing(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Entry => "entry",
            Self::Exit => "exit",
        }
    }
}

/// Running entry and exit totals. Both only ever grow during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counts {
    pub entries: u64,
    pub exits: u64,
}

impl Counts {
    pub fn total(&self) -> u64 {
        self.entries + self.exits
    }
}

/// Per-track crossing state machine against the line `y = line_y`.
///
/// `observe` must be fed samples in frame order for each track id; the
/// classification depends on the previous sample only.
#[derive(Debug, Clone)]
pub struct CrossingCounter<K = u64> {
    line_y: f32,
    history: HashMap<K, f32>,
    counts: Counts,
}

impl<K: Eq + Hash> CrossingCounter<K> {
    pub fn new(line_y: f32) -> Self {
        Self {
            line_y,
            history: HashMap::new(),
            counts: Counts::default(),
        }
    }

    /// Record a centroid sample for `track_id` and classify the move.
    ///
    /// The first sample for an id only seeds the history. The strict/inclusive
    /// pairing below means a track resting exactly on the line never fires, and
    /// a track that reached the line is only counted once it was strictly on
    /// one side before.
    pub fn observe(&mut self, track_id: K, centroid_y: f32) -> CrossingEvent {
        let line = self.line_y;
        let Some(prev) = self.history.insert(track_id, centroid_y) else {
            return CrossingEvent::None;
        };

        if prev < line && centroid_y >= line {
            self.counts.exits += 1;
            CrossingEvent::Exit
        } else if prev > line && centroid_y <= line {
            self.counts.entries += 1;
            CrossingEvent::Entry
        } else {
            CrossingEvent::None
        }
    }

    pub fn line_y(&self) -> f32 {
        self.line_y
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn entries(&self) -> u64 {
        self.counts.entries
    }

    pub fn exits(&self) -> u64 {
        self.counts.exits
    }

    /// Last recorded centroid y for `track_id`, if it was ever observed.
    pub fn last_y(&self, track_id: &K) -> Option<f32> {
        self.history.get(track_id).copied()
    }

    /// Number of track ids with a history entry. Entries are never evicted.
    pub fn known_tracks(&self) -> usize {
        self.history.len()
    }

    /// Forget all history and zero the totals, keeping the reference line.
    pub fn reset(&mut self) {
        self.history.clear();
        self.counts = Counts::default();
    }
}
