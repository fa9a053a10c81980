//! Detector that replays detections recorded by an offline model run.
//!
//! The file holds one JSON object per line:
//!
//! ```text
//! {"frame": 0, "detections": [{"bbox": [x1, y1, x2, y2], "score": 0.91, "class_id": 0}]}
//! ```
//!
//! Frames are zero-based and match [`Frame::index`]. Blank lines are ignored.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::DetectionSource;
use crate::detection::Detection;
use crate::error::{FootfallError, Result};
use crate::frame::Frame;

#[derive(Debug, Deserialize)]
struct FrameRecord {
    frame: u64,
    #[serde(default)]
    detections: Vec<Detection>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordedDetectionsError {
    #[error("no detections recorded for frame {0}")]
    MissingFrame(u64),
}

pub struct RecordedDetections {
    frames: HashMap<u64, Vec<Detection>>,
    require_every_frame: bool,
}

impl RecordedDetections {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            std::fs::File::open(path).map_err(|e| FootfallError::source_unavailable(path, e))?;

        let mut frames: HashMap<u64, Vec<Detection>> = HashMap::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: FrameRecord = serde_json::from_str(&line).map_err(|e| {
                FootfallError::config(format!("{}:{}: {e}", path.display(), lineno + 1))
            })?;
            frames.entry(record.frame).or_default().extend(record.detections);
        }

        debug!(frames = frames.len(), path = %path.display(), "loaded recorded detections");
        Ok(Self::from_frames(frames))
    }

    pub fn from_frames(frames: HashMap<u64, Vec<Detection>>) -> Self {
        Self {
            frames,
            require_every_frame: false,
        }
    }

    /// Treat a frame with no record as a detector failure instead of an empty frame.
    pub fn require_every_frame(mut self, require: bool) -> Self {
        self.require_every_frame = require;
        self
    }

    pub fn recorded_frames(&self) -> usize {
        self.frames.len()
    }
}

impl DetectionSource for RecordedDetections {
    type Error = RecordedDetectionsError;

    fn detect(
        &mut self,
        frame: &Frame,
        class_filter: &[u32],
        confidence_threshold: f32,
    ) -> std::result::Result<Vec<Detection>, Self::Error> {
        let Some(dets) = self.frames.get(&frame.index) else {
            if self.require_every_frame {
                return Err(RecordedDetectionsError::MissingFrame(frame.index));
            }
            return Ok(Vec::new());
        };

        Ok(dets
            .iter()
            .filter(|d| class_filter.contains(&d.class_id) && d.score >= confidence_threshold)
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_records(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("footfall-{name}-{}.jsonl", std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    fn frame(index: u64) -> Frame {
        Frame::new(index, RgbImage::new(1, 1))
    }

    #[test]
    fn test_replays_and_filters() {
        let path = write_records(
            "replay",
            r#"{"frame": 0, "detections": [{"bbox": [0, 0, 10, 10], "score": 0.9, "class_id": 0}, {"bbox": [0, 0, 10, 10], "score": 0.9, "class_id": 2}, {"bbox": [0, 0, 10, 10], "score": 0.1}]}

{"frame": 2, "detections": []}
"#,
        );
        let mut recorded = RecordedDetections::open(&path).unwrap();
        assert_eq!(recorded.recorded_frames(), 2);

        let dets = recorded.detect(&frame(0), &[0], 0.3).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox, [0.0, 0.0, 10.0, 10.0]);
        assert!(recorded.detect(&frame(1), &[0], 0.3).unwrap().is_empty());
    }

    #[test]
    fn test_strict_mode_reports_missing_frames() {
        let mut recorded = RecordedDetections::from_frames(HashMap::new()).require_every_frame(true);
        assert_eq!(
            recorded.detect(&frame(4), &[0], 0.3),
            Err(RecordedDetectionsError::MissingFrame(4))
        );
    }

    #[test]
    fn test_bad_line_is_reported_with_position() {
        let path = write_records("badline", "{\"frame\": 0}\nnot json\n");
        let err = RecordedDetections::open(&path).err().unwrap();
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = RecordedDetections::open("/no/such/detections.jsonl").err().unwrap();
        assert!(matches!(err, FootfallError::SourceUnavailable { .. }));
    }
}
