//! Constant-velocity Kalman filter over (cx, cy, aspect, height) box state.
//!
//! State is 8-dimensional: the four XYAH measurements followed by their
//! velocities. Noise scales with box height.

use ndarray::{Array1, Array2};

use super::TrackerError;

const NDIM: usize = 4;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn diag(std: &[f64]) -> Array2<f64> {
    let mut m = Array2::zeros((std.len(), std.len()));
    for (i, s) in std.iter().enumerate() {
        m[[i, i]] = s * s;
    }
    m
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = Array2::eye(2 * NDIM);
        let mut update_mat = Array2::zeros((NDIM, 2 * NDIM));
        for i in 0..NDIM {
            motion_mat[[i, NDIM + i]] = 1.0;
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    /// Start a track from an unassociated XYAH measurement with zero velocity.
    pub fn initiate(&self, measurement: [f64; 4]) -> (Array1<f64>, Array2<f64>) {
        let mut mean = Array1::zeros(2 * NDIM);
        for (i, m) in measurement.iter().enumerate() {
            mean[i] = *m;
        }

        let pos = 2.0 * self.std_weight_position * measurement[3];
        let vel = 10.0 * self.std_weight_velocity * measurement[3];
        let cov = diag(&[pos, pos, 1e-2, pos, vel, vel, 1e-5, vel]);

        (mean, cov)
    }

    pub fn predict(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let pos = self.std_weight_position * mean[3];
        let vel = self.std_weight_velocity * mean[3];
        let motion_cov = diag(&[pos, pos, 1e-2, pos, vel, vel, 1e-5, vel]);

        let new_mean = self.motion_mat.dot(mean);
        let new_cov = self.motion_mat.dot(covariance).dot(&self.motion_mat.t()) + motion_cov;
        (new_mean, new_cov)
    }

    fn project(&self, mean: &Array1<f64>, covariance: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
        let pos = self.std_weight_position * mean[3];
        let innovation_cov = diag(&[pos, pos, 1e-1, pos]);

        let mean_proj = self.update_mat.dot(mean);
        let cov_proj = self.update_mat.dot(covariance).dot(&self.update_mat.t()) + innovation_cov;
        (mean_proj, cov_proj)
    }

    /// Correct the predicted state with an associated measurement.
    pub fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; 4],
    ) -> Result<(Array1<f64>, Array2<f64>), TrackerError> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let innovation = Array1::from_vec(measurement.to_vec()) - projected_mean;

        // H = [I 0], so P * H^T is the left 8x4 block of P.
        let s_inv = invert_4x4(&projected_cov)?;
        let kalman_gain = covariance.dot(&self.update_mat.t()).dot(&s_inv);

        let new_mean = mean + &kalman_gain.dot(&innovation);
        let new_cov = covariance - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t());
        Ok((new_mean, new_cov))
    }
}

fn invert_4x4(m: &Array2<f64>) -> Result<Array2<f64>, TrackerError> {
    let inv = nalgebra::Matrix4::from_fn(|i, j| m[[i, j]])
        .try_inverse()
        .ok_or(TrackerError::SingularCovariance)?;
    Ok(Array2::from_shape_fn((NDIM, NDIM), |(i, j)| inv[(i, j)]))
}
