//! Burn inference backend for person detection.
//!
//! `BurnDetector` runs any model implementing [`BurnModel`] on a frame and
//! turns its raw boxes into [`Detection`]s for the counting pipeline.
//!
//! # Example
//!
//! ```ignore
//! use burn::backend::NdArray;
//! use footfall_rs::integration::{BurnDetector, BurnModel, RawDetection};
//!
//! struct MyYoloModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MyYoloModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<RawDetection> {
//!         // Run inference
//!     }
//! }
//!
//! let detector = BurnDetector::new(MyYoloModel::load("model.bin"), Default::default());
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use thiserror::Error;

use super::{DetectionBuilder, DetectionSource};
use crate::detection::Detection;
use crate::frame::Frame;

#[derive(Error, Debug, Clone)]
pub enum BurnDetectorError {
    #[error("frame is {got:?} but the model expects {expected:?} (width, height)")]
    InputSizeMismatch { expected: (u32, u32), got: (u32, u32) },
}

/// Raw model output for one box, before filtering.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// Bounding box: [x1, y1, x2, y2] or [cx, cy, w, h] depending on the model
    pub bbox: [f32; 4],
    pub score: f32,
    pub class_id: u32,
}

/// A detection network runnable on a Burn backend.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Forward pass on a `[1, 3, height, width]` tensor scaled to [0, 1].
    fn forward(&self, input: Tensor<B, 4>) -> Vec<RawDetection>;

    /// Expected input size as (width, height).
    fn input_size(&self) -> (u32, u32) {
        (640, 640)
    }

    /// Whether boxes come out as centre/size rather than corners.
    fn bbox_is_xywh(&self) -> bool {
        true
    }
}

pub struct BurnDetector<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
}

impl<B: Backend, M: BurnModel<B>> BurnDetector<B, M> {
    pub fn new(model: M, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Convert an RGB frame into a normalised CHW tensor.
    ///
    /// Frames must already match the model input size; resizing belongs to
    /// the decoder.
    pub fn preprocess(&self, frame: &Frame) -> Result<Tensor<B, 4>, BurnDetectorError> {
        let (width, height) = self.model.input_size();
        let got = (frame.width(), frame.height());
        if got != (width, height) {
            return Err(BurnDetectorError::InputSizeMismatch {
                expected: (width, height),
                got,
            });
        }

        let plane = (width * height) as usize;
        let mut data = vec![0f32; 3 * plane];
        for (i, pixel) in frame.image.pixels().enumerate() {
            for c in 0..3 {
                data[c * plane + i] = pixel[c] as f32 / 255.0;
            }
        }

        Ok(
            Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape([
                1,
                3,
                height as usize,
                width as usize,
            ]),
        )
    }

    fn postprocess(
        &self,
        raw: Vec<RawDetection>,
        class_filter: &[u32],
        confidence_threshold: f32,
    ) -> Vec<Detection> {
        raw.into_iter()
            .filter(|d| d.score >= confidence_threshold && class_filter.contains(&d.class_id))
            .map(|d| {
                let [a, b, c, e] = d.bbox;
                let builder = DetectionBuilder::new().score(d.score).class_id(d.class_id);
                if self.model.bbox_is_xywh() {
                    builder.xywh(a, b, c, e).build()
                } else {
                    builder.tlbr(a, b, c, e).build()
                }
            })
            .collect()
    }
}

impl<B: Backend, M: BurnModel<B>> DetectionSource for BurnDetector<B, M> {
    type Error = BurnDetectorError;

    fn detect(
        &mut self,
        frame: &Frame,
        class_filter: &[u32],
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, Self::Error> {
        let tensor = self.preprocess(frame)?;
        let raw = self.model.forward(tensor);
        Ok(self.postprocess(raw, class_filter, confidence_threshold))
    }
}
