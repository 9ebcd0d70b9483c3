//! Box decoding: raw predictions to pixel-space detections.
//!
//! Each raw prediction carries a normalized center-based box and a
//! per-class score vector. Decoding picks the best class, applies the
//! confidence threshold, and converts to a top-left pixel box.
//! Malformed predictions (empty or non-finite scores, non-finite
//! geometry) are skipped without failing the frame.

use crate::detect::backend::RawPrediction;

/// A decoded, image-space detection. Lives for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Top-left corner, pixels. May be negative for boxes whose
    /// center sits near the frame edge; the annotator clamps.
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub class_id: usize,
    pub confidence: f32,
}

impl Detection {
    pub fn area(&self) -> f32 {
        self.w * self.h
    }
}

/// Decode raw predictions into detections above the confidence
/// threshold.
///
/// Emits nothing for a prediction whose best score is <= `threshold`.
/// An empty input yields an empty output. Output order follows input
/// order but carries no meaning; downstream stages must not assume it
/// reflects confidence.
pub fn decode(
    preds: &[RawPrediction],
    frame_w: u32,
    frame_h: u32,
    confidence_threshold: f32,
) -> Vec<Detection> {
    let mut detections = Vec::new();
    let mut skipped = 0usize;

    for pred in preds {
        let Some((class_id, confidence)) = best_class(&pred.scores) else {
            skipped += 1;
            continue;
        };
        if confidence <= confidence_threshold {
            continue;
        }
        if !geometry_is_finite(pred) {
            skipped += 1;
            continue;
        }

        let center_x = pred.cx * frame_w as f32;
        let center_y = pred.cy * frame_h as f32;
        let w = pred.w * frame_w as f32;
        let h = pred.h * frame_h as f32;

        detections.push(Detection {
            x: center_x - w / 2.0,
            y: center_y - h / 2.0,
            w,
            h,
            class_id,
            confidence,
        });
    }

    if skipped > 0 {
        log::debug!("decode: skipped {} malformed prediction(s)", skipped);
    }
    detections
}

/// Argmax over the score vector. `None` when the vector is empty or
/// contains a non-finite score.
fn best_class(scores: &[f32]) -> Option<(usize, f32)> {
    if scores.is_empty() || scores.iter().any(|s| !s.is_finite()) {
        return None;
    }
    let mut best = 0usize;
    for (idx, score) in scores.iter().enumerate() {
        if *score > scores[best] {
            best = idx;
        }
    }
    Some((best, scores[best]))
}

fn geometry_is_finite(pred: &RawPrediction) -> bool {
    pred.cx.is_finite()
        && pred.cy.is_finite()
        && pred.w.is_finite()
        && pred.h.is_finite()
        && pred.w >= 0.0
        && pred.h >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(cx: f32, cy: f32, w: f32, h: f32, scores: &[f32]) -> RawPrediction {
        RawPrediction {
            cx,
            cy,
            w,
            h,
            scores: scores.to_vec(),
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(decode(&[], 640, 480, 0.5).is_empty());
    }

    #[test]
    fn converts_center_box_to_pixel_corner() {
        let preds = [pred(0.5, 0.5, 0.25, 0.5, &[0.1, 0.9])];
        let out = decode(&preds, 400, 200, 0.5);
        assert_eq!(out.len(), 1);
        let d = &out[0];
        assert_eq!(d.class_id, 1);
        assert_eq!(d.confidence, 0.9);
        assert_eq!(d.w, 100.0);
        assert_eq!(d.h, 100.0);
        assert_eq!(d.x, 150.0);
        assert_eq!(d.y, 50.0);
    }

    #[test]
    fn never_emits_at_or_below_threshold() {
        // The threshold comparison is strict for every threshold.
        for threshold in [0.0, 0.3, 0.5, 0.9, 1.0] {
            let preds = [
                pred(0.5, 0.5, 0.1, 0.1, &[threshold]),
                pred(0.5, 0.5, 0.1, 0.1, &[threshold * 0.5]),
                pred(0.5, 0.5, 0.1, 0.1, &[(threshold + 0.01).min(1.0)]),
            ];
            for d in decode(&preds, 100, 100, threshold) {
                assert!(d.confidence > threshold);
            }
        }
    }

    #[test]
    fn skips_malformed_predictions() {
        let preds = [
            pred(0.5, 0.5, 0.1, 0.1, &[]),
            pred(0.5, 0.5, 0.1, 0.1, &[f32::NAN, 0.9]),
            pred(f32::INFINITY, 0.5, 0.1, 0.1, &[0.9]),
            pred(0.5, 0.5, -0.1, 0.1, &[0.9]),
            pred(0.5, 0.5, 0.1, 0.1, &[0.9]),
        ];
        let out = decode(&preds, 100, 100, 0.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, 0.9);
    }

    #[test]
    fn argmax_picks_first_of_tied_scores() {
        let preds = [pred(0.5, 0.5, 0.1, 0.1, &[0.8, 0.8])];
        let out = decode(&preds, 100, 100, 0.5);
        assert_eq!(out[0].class_id, 0);
    }
}
