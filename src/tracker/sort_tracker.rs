//! IoU tracker with Kalman motion prediction and confirmation/aging policy.

use serde::{Deserialize, Serialize};

use super::kalman_filter::KalmanFilter;
use super::matching::{self, AssignmentResult};
use super::track::Track;
use super::{MultiObjectTracker, TrackState, TrackerError};
use crate::adapter::AdaptedDetection;
use crate::error::{FootfallError, Result};
use crate::frame::Frame;
use crate::rect::Rect;

/// Configuration for the [`SortTracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames a confirmed track may go without a detection before it is dropped
    pub max_age: u32,
    /// Consecutive hits needed before a track is confirmed
    pub n_init: u32,
    /// Largest `1 - IoU` accepted for a track/detection pair
    pub max_iou_distance: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_age: 30,
            n_init: 3,
            max_iou_distance: 0.7,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_init == 0 {
            return Err(FootfallError::config("tracker.n_init must be at least 1"));
        }
        if !(self.max_iou_distance > 0.0 && self.max_iou_distance <= 1.0) {
            return Err(FootfallError::config(format!(
                "tracker.max_iou_distance must be within (0, 1], got {}",
                self.max_iou_distance
            )));
        }
        Ok(())
    }
}

pub struct SortTracker {
    tracks: Vec<Track>,
    config: TrackerConfig,
    kalman_filter: KalmanFilter,
    next_id: u64,
}

impl SortTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracks: Vec::new(),
            config,
            kalman_filter: KalmanFilter::default(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Live tracks after the last update, tentative ones included.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Advance one frame with this frame's detections.
    ///
    /// All-or-nothing: on error the tracker is left exactly as it was before
    /// the call, predictions included.
    pub fn step(
        &mut self,
        detections: &[AdaptedDetection],
    ) -> std::result::Result<Vec<Track>, TrackerError> {
        let mut tracks = self.tracks.clone();
        for track in &mut tracks {
            track.predict(&self.kalman_filter);
        }

        let track_rects: Vec<Rect> = tracks.iter().map(Track::rect).collect();
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.tlwh).collect();
        let mut dists = matching::iou_distance(&track_rects, &det_rects);

        // Never associate across classes.
        for (i, track) in tracks.iter().enumerate() {
            for (j, det) in detections.iter().enumerate() {
                if track.class_id != det.class_id {
                    dists[[i, j]] = 1.0;
                }
            }
        }

        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::linear_assignment(&dists, self.config.max_iou_distance);

        for (itrack, idet) in matches {
            tracks[itrack].update(&detections[idet], &self.kalman_filter, self.config.n_init)?;
        }
        for itrack in unmatched_tracks {
            tracks[itrack].mark_missed(self.config.max_age);
        }
        let mut next_id = self.next_id;
        for idet in unmatched_detections {
            let mut track = Track::new(next_id, &detections[idet], &self.kalman_filter);
            if self.config.n_init <= 1 {
                track.state = TrackState::Confirmed;
            }
            next_id += 1;
            tracks.push(track);
        }

        tracks.retain(|t| !t.is_deleted());
        self.tracks = tracks;
        self.next_id = next_id;
        Ok(self.tracks.clone())
    }
}

impl MultiObjectTracker for SortTracker {
    type Track = Track;
    type Error = TrackerError;

    fn update(
        &mut self,
        _frame: &Frame,
        detections: &[AdaptedDetection],
    ) -> std::result::Result<Vec<Track>, TrackerError> {
        self.step(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TrackedObject;

    fn det(x: f32, y: f32) -> AdaptedDetection {
        AdaptedDetection {
            tlwh: Rect::new(x, y, 40.0, 100.0),
            confidence: 0.9,
            class_id: 0,
        }
    }

    #[test]
    fn test_confirmation_after_n_init_hits() {
        let mut tracker = SortTracker::new(TrackerConfig::default());
        let t1 = tracker.step(&[det(100.0, 100.0)]).unwrap();
        assert_eq!(t1.len(), 1);
        assert!(!t1[0].is_confirmed());

        let t2 = tracker.step(&[det(102.0, 105.0)]).unwrap();
        assert!(!t2[0].is_confirmed());

        let t3 = tracker.step(&[det(104.0, 110.0)]).unwrap();
        assert_eq!(t3.len(), 1);
        assert!(t3[0].is_confirmed());
        assert_eq!(t3[0].track_id(), t1[0].track_id());
    }

    #[test]
    fn test_tentative_track_dies_on_first_miss() {
        let mut tracker = SortTracker::new(TrackerConfig::default());
        tracker.step(&[det(100.0, 100.0)]).unwrap();
        assert!(tracker.step(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_confirmed_track_survives_until_max_age() {
        let config = TrackerConfig {
            max_age: 2,
            ..Default::default()
        };
        let mut tracker = SortTracker::new(config);
        for i in 0..3 {
            tracker.step(&[det(100.0, 100.0 + i as f32)]).unwrap();
        }
        assert_eq!(tracker.tracks()[0].state, TrackState::Confirmed);

        assert_eq!(tracker.step(&[]).unwrap().len(), 1);
        assert_eq!(tracker.step(&[]).unwrap().len(), 1);
        assert!(tracker.step(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_ids_are_per_tracker() {
        let mut a = SortTracker::new(TrackerConfig::default());
        let mut b = SortTracker::new(TrackerConfig::default());
        let ta = a.step(&[det(0.0, 0.0), det(300.0, 300.0)]).unwrap();
        let tb = b.step(&[det(0.0, 0.0)]).unwrap();
        assert_eq!(ta[0].track_id, 1);
        assert_eq!(ta[1].track_id, 2);
        assert_eq!(tb[0].track_id, 1);
    }

    #[test]
    fn test_n_init_one_confirms_immediately() {
        let config = TrackerConfig {
            n_init: 1,
            ..Default::default()
        };
        let mut tracker = SortTracker::new(config);
        assert!(tracker.step(&[det(0.0, 0.0)]).unwrap()[0].is_confirmed());
    }

    #[test]
    fn test_failed_step_leaves_tracker_untouched() {
        let config = TrackerConfig {
            max_iou_distance: 1.0,
            ..Default::default()
        };
        let mut tracker = SortTracker::new(config);
        // A zero-height box has no height-scaled noise, so re-associating it
        // hits a singular innovation covariance.
        let flat = AdaptedDetection {
            tlwh: Rect::new(300.0, 300.0, 40.0, 0.0),
            confidence: 0.9,
            class_id: 0,
        };
        let frame = [det(100.0, 100.0), flat];
        tracker.step(&frame).unwrap();
        let before: Vec<(u64, u32, u32, Rect)> = tracker
            .tracks()
            .iter()
            .map(|t| (t.track_id, t.age, t.hits, t.rect()))
            .collect();

        assert!(matches!(
            tracker.step(&frame),
            Err(TrackerError::SingularCovariance)
        ));
        let after: Vec<(u64, u32, u32, Rect)> = tracker
            .tracks()
            .iter()
            .map(|t| (t.track_id, t.age, t.hits, t.rect()))
            .collect();
        assert_eq!(before, after);

        // The next good frame picks up from the pre-failure state.
        let tracks = tracker.step(&[det(100.0, 100.0)]).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!((tracks[0].track_id, tracks[0].age, tracks[0].hits), (1, 2, 2));
    }

    #[test]
    fn test_rejects_zero_n_init() {
        let config = TrackerConfig {
            n_init: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
