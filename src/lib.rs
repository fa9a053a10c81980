//! Footfall counting: directional crossings of tracked people over a
//! horizontal reference line.
//!
//! Each frame flows through a [`DetectionSource`], the detection adapter, a
//! [`MultiObjectTracker`] and finally the [`CrossingCounter`], which keeps one
//! last-known centroid per track id and classifies every new sample as an
//! entry, an exit or nothing. [`FootfallPipeline`] sequences those calls.

pub mod adapter;
pub mod config;
pub mod counter;
pub mod detection;
pub mod error;
pub mod frame;
pub mod integration;
pub mod rect;
pub mod render;
pub mod tracker;

pub use adapter::{AdaptedDetection, adapt_detections};
pub use config::{CentroidMode, FootfallConfig};
pub use counter::{Counts, CrossingCounter, CrossingEvent};
pub use detection::Detection;
pub use error::{FootfallError, Result};
pub use frame::{Frame, FrameSink, ImageSequenceSink, ImageSequenceSource};
pub use integration::{
    DetectionBuilder, DetectionSource, FootfallPipeline, FrameReport, RecordedDetections,
    RunSummary, StopHandle,
};
pub use rect::Rect;
pub use render::{Annotator, FrameRenderer};
pub use tracker::{MultiObjectTracker, SortTracker, TrackedObject, TrackerConfig};
