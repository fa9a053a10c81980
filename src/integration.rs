//! Integration layer connecting detection backends, a tracker and the
//! crossing counter into a per-frame pipeline.

mod builder;
mod detector;
mod pipeline;
mod recorded;

pub use builder::DetectionBuilder;
pub use detector::DetectionSource;
pub use pipeline::{CrossingRecord, FootfallPipeline, FrameReport, RunSummary, StopHandle};
pub use recorded::{RecordedDetections, RecordedDetectionsError};

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnDetector, BurnDetectorError, BurnModel, RawDetection};
