//! Track-to-detection association.

use ndarray::Array2;

use crate::rect::Rect;

/// Cost assigned to pairs that must never be matched.
const INFEASIBLE: f64 = 1e6;

/// `1 - IoU` between every track box and every detection box.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    Array2::from_shape_fn((track_boxes.len(), det_boxes.len()), |(i, j)| {
        1.0 - track_boxes[i].iou(&det_boxes[j])
    })
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Minimum-cost matching that only accepts pairs with cost `<= max_cost`.
///
/// Rows are tracks, columns detections. The matrix is padded square for the
/// Jonker-Volgenant solver; padding and gated pairs come back unmatched.
pub fn linear_assignment(cost_matrix: &Array2<f32>, max_cost: f32) -> AssignmentResult {
    let (rows, cols) = cost_matrix.dim();
    if rows == 0 || cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..rows).collect(),
            unmatched_detections: (0..cols).collect(),
        };
    }

    let size = rows.max(cols);
    let padded = Array2::from_shape_fn((size, size), |(i, j)| {
        if i < rows && j < cols && cost_matrix[[i, j]] <= max_cost {
            cost_matrix[[i, j]] as f64
        } else {
            INFEASIBLE
        }
    });

    let mut result = AssignmentResult::default();
    let mut det_matched = vec![false; cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row, &col) in row_to_col.iter().enumerate().take(rows) {
                if col < cols && cost_matrix[[row, col]] <= max_cost {
                    result.matches.push((row, col));
                    det_matched[col] = true;
                } else {
                    result.unmatched_tracks.push(row);
                }
            }
        }
        Err(_) => result.unmatched_tracks = (0..rows).collect(),
    }

    result.unmatched_detections = det_matched
        .iter()
        .enumerate()
        .filter_map(|(j, &m)| (!m).then_some(j))
        .collect();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_assignment_prefers_low_cost() {
        let cost = array![[0.9, 0.1], [0.2, 0.8]];
        let res = linear_assignment(&cost, 0.7);
        let mut matches = res.matches.clone();
        matches.sort();
        assert_eq!(matches, vec![(0, 1), (1, 0)]);
        assert!(res.unmatched_tracks.is_empty());
        assert!(res.unmatched_detections.is_empty());
    }

    #[test]
    fn test_assignment_gates_expensive_pairs() {
        let cost = array![[0.95], [0.3]];
        let res = linear_assignment(&cost, 0.7);
        assert_eq!(res.matches, vec![(1, 0)]);
        assert_eq!(res.unmatched_tracks, vec![0]);
    }

    #[test]
    fn test_empty_sides() {
        let res = linear_assignment(&Array2::zeros((0, 3)), 0.7);
        assert_eq!(res.unmatched_detections, vec![0, 1, 2]);
        let res = linear_assignment(&Array2::zeros((2, 0)), 0.7);
        assert_eq!(res.unmatched_tracks, vec![0, 1]);
    }

    #[test]
    fn test_iou_distance_shape() {
        let a = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        let b = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 50.0, 5.0, 5.0)];
        let d = iou_distance(&a, &b);
        assert_eq!(d.dim(), (1, 2));
        assert!(d[[0, 0]].abs() < 1e-6);
        assert_eq!(d[[0, 1]], 1.0);
    }
}
