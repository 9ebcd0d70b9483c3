//! Greedy non-maximum suppression.
//!
//! Removes redundant overlapping boxes, keeping the highest-confidence
//! box per cluster. Confidence filtering happened upstream in the
//! decoder; the score threshold here is applied as given, nothing more.

use crate::detect::decode::Detection;

/// Intersection-over-union of two boxes.
///
/// Boxes with non-positive union (both degenerate) score 0, so
/// zero-area boxes never suppress or get suppressed.
pub fn iou(a: &Detection, b: &Detection) -> f32 {
    let left = a.x.max(b.x);
    let top = a.y.max(b.y);
    let right = (a.x + a.w).min(b.x + b.w);
    let bottom = (a.y + a.h).min(b.y + b.h);

    let inter = (right - left).max(0.0) * (bottom - top).max(0.0);
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}

/// Greedy NMS. Returns the indices of surviving detections, in
/// selection order (confidence descending).
///
/// `score_threshold` is applied as given, with the decoder's strict
/// rule: candidates at or below it are excluded. The decoder already
/// filtered with the same rule, so matching thresholds make this a
/// no-op; the suppressor does not re-check confidence beyond that.
///
/// Candidates are stable-sorted by confidence descending, so
/// confidence ties resolve by input position (first seen wins) and
/// identical input always yields the identical survivor sequence.
pub fn suppress(detections: &[Detection], iou_threshold: f32, score_threshold: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..detections.len())
        .filter(|&i| detections[i].confidence > score_threshold)
        .collect();
    // Stable sort keeps input order among equal confidences.
    order.sort_by(|&a, &b| {
        detections[b]
            .confidence
            .partial_cmp(&detections[a].confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for &idx in &order {
        if suppressed[idx] {
            continue;
        }
        keep.push(idx);
        for &other in &order {
            if other == idx || suppressed[other] {
                continue;
            }
            if iou(&detections[idx], &detections[other]) > iou_threshold {
                suppressed[other] = true;
            }
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f32, y: f32, w: f32, h: f32, confidence: f32) -> Detection {
        Detection {
            x,
            y,
            w,
            h,
            class_id: 0,
            confidence,
        }
    }

    #[test]
    fn keeps_highest_of_fully_overlapping_pair() {
        let dets = [det(10.0, 10.0, 50.0, 50.0, 0.9), det(10.0, 10.0, 50.0, 50.0, 0.6)];
        assert_eq!(suppress(&dets, 0.4, 0.0), vec![0]);
    }

    #[test]
    fn disjoint_boxes_all_survive() {
        let dets = [
            det(0.0, 0.0, 10.0, 10.0, 0.5),
            det(100.0, 100.0, 10.0, 10.0, 0.9),
            det(200.0, 0.0, 10.0, 10.0, 0.7),
        ];
        let mut keep = suppress(&dets, 0.4, 0.0);
        keep.sort_unstable();
        assert_eq!(keep, vec![0, 1, 2]);
    }

    #[test]
    fn tie_confidences_resolve_by_input_order() {
        let dets = [det(0.0, 0.0, 10.0, 10.0, 0.8), det(1.0, 1.0, 10.0, 10.0, 0.8)];
        // Both identical runs must pick the same survivor: the first.
        assert_eq!(suppress(&dets, 0.4, 0.0), suppress(&dets, 0.4, 0.0));
        assert_eq!(suppress(&dets, 0.4, 0.0), vec![0]);
    }

    #[test]
    fn idempotent_over_own_output() {
        let dets = vec![
            det(0.0, 0.0, 20.0, 20.0, 0.9),
            det(2.0, 2.0, 20.0, 20.0, 0.8),
            det(100.0, 100.0, 20.0, 20.0, 0.7),
            det(101.0, 99.0, 20.0, 20.0, 0.7),
            det(300.0, 300.0, 20.0, 20.0, 0.6),
        ];
        let keep = suppress(&dets, 0.4, 0.0);
        let survivors: Vec<Detection> = keep.iter().map(|&i| dets[i].clone()).collect();
        let again = suppress(&survivors, 0.4, 0.0);
        assert_eq!(again.len(), survivors.len());
        let mut sorted = again.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..survivors.len()).collect::<Vec<_>>());
    }

    #[test]
    fn degenerate_boxes_are_never_suppressed() {
        let dets = [
            det(10.0, 10.0, 50.0, 50.0, 0.9),
            det(20.0, 20.0, 0.0, 30.0, 0.5),
            det(20.0, 20.0, 30.0, 0.0, 0.4),
        ];
        let mut keep = suppress(&dets, 0.4, 0.0);
        keep.sort_unstable();
        assert_eq!(keep, vec![0, 1, 2]);
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = det(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = det(5.0, 0.0, 10.0, 10.0, 1.0);
        let v = iou(&a, &b);
        assert!((v - 1.0 / 3.0).abs() < 1e-6);
    }
}
