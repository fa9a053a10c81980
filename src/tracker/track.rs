//! Single tracked object.

use ndarray::{Array1, Array2};

use super::kalman_filter::KalmanFilter;
use super::track_state::TrackState;
use super::{TrackedObject, TrackerError};
use crate::adapter::AdaptedDetection;
use crate::rect::Rect;

fn to_xyah_f64(rect: &Rect) -> [f64; 4] {
    rect.to_xyah().map(f64::from)
}

#[derive(Debug, Clone)]
pub struct Track {
    /// Identifier, unique within the tracker that created it
    pub track_id: u64,
    pub state: TrackState,
    pub class_id: u32,
    /// Confidence of the last associated detection
    pub score: f32,
    /// Total number of associated detections
    pub hits: u32,
    /// Frames since the track was created
    pub age: u32,
    /// Frames since the last associated detection
    pub time_since_update: u32,
    mean: Array1<f64>,
    covariance: Array2<f64>,
}

impl Track {
    pub(crate) fn new(track_id: u64, det: &AdaptedDetection, kalman_filter: &KalmanFilter) -> Self {
        let (mean, covariance) = kalman_filter.initiate(to_xyah_f64(&det.tlwh));
        Self {
            track_id,
            state: TrackState::Tentative,
            class_id: det.class_id,
            score: det.confidence,
            hits: 1,
            age: 1,
            time_since_update: 0,
            mean,
            covariance,
        }
    }

    /// Current box estimate from the filter state.
    pub fn rect(&self) -> Rect {
        Rect::from_xyah(
            self.mean[0] as f32,
            self.mean[1] as f32,
            self.mean[2] as f32,
            self.mean[3] as f32,
        )
    }

    pub fn is_tentative(&self) -> bool {
        self.state == TrackState::Tentative
    }

    pub fn is_deleted(&self) -> bool {
        self.state == TrackState::Deleted
    }

    pub(crate) fn predict(&mut self, kalman_filter: &KalmanFilter) {
        let (mean, covariance) = kalman_filter.predict(&self.mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;
        self.age += 1;
        self.time_since_update += 1;
    }

    pub(crate) fn update(
        &mut self,
        det: &AdaptedDetection,
        kalman_filter: &KalmanFilter,
        n_init: u32,
    ) -> Result<(), TrackerError> {
        let (mean, covariance) =
            kalman_filter.update(&self.mean, &self.covariance, to_xyah_f64(&det.tlwh))?;
        self.mean = mean;
        self.covariance = covariance;
        self.score = det.confidence;
        self.hits += 1;
        self.time_since_update = 0;
        if self.is_tentative() && self.hits >= n_init {
            self.state = TrackState::Confirmed;
        }
        Ok(())
    }

    /// No detection was associated this frame.
    pub(crate) fn mark_missed(&mut self, max_age: u32) {
        if self.is_tentative() || self.time_since_update > max_age {
            self.state = TrackState::Deleted;
        }
    }
}

impl TrackedObject for Track {
    type Id = u64;

    fn track_id(&self) -> u64 {
        self.track_id
    }

    fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    fn tlbr(&self) -> [f32; 4] {
        self.rect().to_tlbr()
    }
}
