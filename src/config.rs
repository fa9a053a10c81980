//! Run configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FootfallError, Result};
use crate::tracker::TrackerConfig;

/// How the vertical midpoint of a track box is turned into a centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CentroidMode {
    /// Integer midpoint: box corners and the midpoint are truncated toward zero.
    #[default]
    Truncate,
    /// Floating midpoint `(y1 + y2) / 2`.
    Exact,
}

impl CentroidMode {
    pub fn centroid_y(&self, y1: f32, y2: f32) -> f32 {
        match self {
            Self::Truncate => ((y1.trunc() + y2.trunc()) / 2.0).trunc(),
            Self::Exact => (y1 + y2) / 2.0,
        }
    }
}

/// Parameters of one counting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootfallConfig {
    /// y-coordinate of the horizontal reference line, in pixels
    pub line_y: f32,
    /// Minimum detector confidence forwarded to the tracker
    pub confidence_threshold: f32,
    /// Detector class counted (COCO person is 0)
    pub target_class: u32,
    pub centroid: CentroidMode,
    pub tracker: TrackerConfig,
}

impl Default for FootfallConfig {
    fn default() -> Self {
        Self {
            line_y: 360.0,
            confidence_threshold: 0.3,
            target_class: 0,
            centroid: CentroidMode::default(),
            tracker: TrackerConfig::default(),
        }
    }
}

impl FootfallConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FootfallError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.line_y.is_finite() {
            return Err(FootfallError::config("line_y must be finite"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(FootfallError::config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        self.tracker.validate()
    }
}
