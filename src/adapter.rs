//! Reshapes detector output into the tracker's input contract.

use serde::Serialize;

use crate::detection::Detection;
use crate::rect::Rect;

/// Detection in the (x, y, width, height) form trackers consume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdaptedDetection {
    pub tlwh: Rect,
    pub confidence: f32,
    pub class_id: u32,
}

impl AdaptedDetection {
    pub fn from_detection(det: &Detection) -> Self {
        Self {
            tlwh: det.rect(),
            confidence: det.score,
            class_id: det.class_id,
        }
    }
}

/// Keep detections of `target_class` scoring at least `confidence_threshold`,
/// in input order, converted to TLWH. Width and height are the plain corner
/// differences; nothing is clamped.
pub fn adapt_detections(
    detections: &[Detection],
    target_class: u32,
    confidence_threshold: f32,
) -> Vec<AdaptedDetection> {
    detections
        .iter()
        .filter(|d| d.class_id == target_class && d.score >= confidence_threshold)
        .map(AdaptedDetection::from_detection)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reshape_is_exact() {
        let dets = [Detection::new(10.0, 20.0, 50.0, 80.0, 0.9, 0)];
        let adapted = adapt_detections(&dets, 0, 0.3);
        assert_eq!(adapted.len(), 1);
        assert_eq!(adapted[0].tlwh.to_tlwh(), [10.0, 20.0, 40.0, 60.0]);
        assert_eq!(adapted[0].confidence, 0.9);
        assert_eq!(adapted[0].class_id, 0);
    }

    #[test]
    fn test_filters_class_and_confidence_keeping_order() {
        let dets = [
            Detection::new(0.0, 0.0, 1.0, 1.0, 0.8, 0),
            Detection::new(1.0, 1.0, 2.0, 2.0, 0.95, 2),
            Detection::new(2.0, 2.0, 3.0, 3.0, 0.29, 0),
            Detection::new(3.0, 3.0, 4.0, 4.0, 0.3, 0),
            Detection::new(4.0, 4.0, 5.0, 5.0, 0.5, 0),
        ];
        let adapted = adapt_detections(&dets, 0, 0.3);
        let xs: Vec<f32> = adapted.iter().map(|d| d.tlwh.x).collect();
        assert_eq!(xs, vec![0.0, 3.0, 4.0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(adapt_detections(&[], 0, 0.0).is_empty());
    }
}
