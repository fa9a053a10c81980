//! Raw detector output.

use serde::{Deserialize, Serialize};

use crate::rect::Rect;

/// One detected object in corner form, as produced by a detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box in TLBR format (x1, y1, x2, y2)
    pub bbox: [f32; 4],
    /// Detection confidence score in [0, 1]
    pub score: f32,
    /// Detector class identifier (COCO person is 0)
    #[serde(default)]
    pub class_id: u32,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, class_id: u32) -> Self {
        Self {
            bbox: [x1, y1, x2, y2],
            score,
            class_id,
        }
    }

    pub fn rect(&self) -> Rect {
        let [x1, y1, x2, y2] = self.bbox;
        Rect::from_tlbr(x1, y1, x2, y2)
    }
}
