//! Trait for object detection backends.

use std::fmt::Display;

use crate::detection::Detection;
use crate::frame::Frame;

/// Produces detections for one frame.
///
/// Implement this to connect any detection model to the counting pipeline.
/// Implementations should only return detections whose class is in
/// `class_filter` and whose score is at least `confidence_threshold`; the
/// pipeline filters again before tracking, so a backend that cannot filter
/// natively may ignore both.
///
/// # Example
///
/// ```ignore
/// use footfall_rs::{Detection, DetectionSource, Frame};
///
/// struct MyDetector;
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(
///         &mut self,
///         frame: &Frame,
///         class_filter: &[u32],
///         confidence_threshold: f32,
///     ) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error: Display;

    fn detect(
        &mut self,
        frame: &Frame,
        class_filter: &[u32],
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, Self::Error>;
}
