//! Builder for creating `Detection` values from the box formats models emit.

use crate::detection::Detection;

#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    class_id: u32,
}

impl DetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box from centre and size, the usual YOLO head output.
    pub fn xywh(self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.tlbr(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    /// Set bounding box from top-left corner and size.
    pub fn tlwh(self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.tlbr(x, y, x + w, y + h)
    }

    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn class_id(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn build(self) -> Detection {
        Detection::new(self.x1, self.y1, self.x2, self.y2, self.score, self.class_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new()
            .xywh(30.0, 50.0, 40.0, 60.0)
            .score(0.95)
            .class_id(2)
            .build();

        assert_eq!(det.bbox, [10.0, 20.0, 50.0, 80.0]);
        assert_eq!(det.score, 0.95);
        assert_eq!(det.class_id, 2);
    }

    #[test]
    fn test_tlwh_matches_tlbr() {
        let a = DetectionBuilder::new().tlwh(10.0, 20.0, 40.0, 60.0).build();
        let b = DetectionBuilder::new().tlbr(10.0, 20.0, 50.0, 80.0).build();
        assert_eq!(a, b);
    }
}
