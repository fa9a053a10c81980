//! Multi-object tracking: the capability traits the pipeline consumes and a
//! reference IoU/Kalman tracker implementing them.

mod kalman_filter;
mod matching;
mod sort_tracker;
mod track;
mod track_state;

use std::fmt::Display;
use std::hash::Hash;

use thiserror::Error;

use crate::adapter::AdaptedDetection;
use crate::frame::Frame;

pub use kalman_filter::KalmanFilter;
pub use matching::{AssignmentResult, iou_distance, linear_assignment};
pub use sort_tracker::{SortTracker, TrackerConfig};
pub use track::Track;
pub use track_state::TrackState;

/// What the counting pipeline needs to know about a track.
pub trait TrackedObject {
    type Id: Eq + Hash + Clone + Display;

    /// Identity, stable for as long as the tracker keeps the track alive.
    fn track_id(&self) -> Self::Id;

    /// Whether the tracker's own continuity policy accepts the track.
    fn is_confirmed(&self) -> bool;

    /// Current box in TLBR format (x1, y1, x2, y2).
    fn tlbr(&self) -> [f32; 4];
}

/// Associates per-frame detections into persistent tracks.
///
/// Implementations own their aging policy; the pipeline only reads the
/// returned tracks.
pub trait MultiObjectTracker {
    type Track: TrackedObject;
    type Error: Display;

    fn update(
        &mut self,
        frame: &Frame,
        detections: &[AdaptedDetection],
    ) -> Result<Vec<Self::Track>, Self::Error>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("innovation covariance is singular")]
    SingularCovariance,
}
