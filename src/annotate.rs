//! Frame annotation.
//!
//! Draws surviving detection boxes onto the frame for the output
//! video. Purely presentational: no access to the tally, and drawing
//! is infallible — every coordinate is clamped to the frame, so
//! malformed or out-of-view boxes degrade to partial or no drawing.

use crate::detect::decode::Detection;
use crate::frame::Frame;

/// Box outline color (RGB). Green, as the reference output uses.
const BOX_COLOR: [u8; 3] = [0, 255, 0];
/// Outline thickness in pixels.
const BOX_THICKNESS: u32 = 2;

/// Draw a rectangle for every surviving detection, any class.
pub fn draw_detections(frame: &mut Frame, detections: &[&Detection]) {
    for detection in detections {
        draw_box(frame, detection);
    }
}

fn draw_box(frame: &mut Frame, detection: &Detection) {
    let width = frame.width();
    let height = frame.height();
    if width == 0 || height == 0 {
        return;
    }
    if !(detection.x.is_finite()
        && detection.y.is_finite()
        && detection.w.is_finite()
        && detection.h.is_finite())
    {
        return;
    }

    let x0 = clamp_coord(detection.x, width);
    let y0 = clamp_coord(detection.y, height);
    let x1 = clamp_coord(detection.x + detection.w, width);
    let y1 = clamp_coord(detection.y + detection.h, height);
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    let t = BOX_THICKNESS.min(x1 - x0).min(y1 - y0);

    // Top and bottom edges.
    fill_rect(frame, x0, y0, x1, (y0 + t).min(y1));
    fill_rect(frame, x0, y1.saturating_sub(t).max(y0), x1, y1);
    // Left and right edges.
    fill_rect(frame, x0, y0, (x0 + t).min(x1), y1);
    fill_rect(frame, x1.saturating_sub(t).max(x0), y0, x1, y1);
}

/// Clamp a pixel coordinate into [0, limit].
fn clamp_coord(value: f32, limit: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value as u32).min(limit)
}

/// Fill the half-open rectangle [x0, x1) x [y0, y1) with the box
/// color. Bounds were clamped by the caller.
fn fill_rect(frame: &mut Frame, x0: u32, y0: u32, x1: u32, y1: u32) {
    let width = frame.width() as usize;
    let pixels = frame.pixels_mut();
    for y in y0..y1 {
        for x in x0..x1 {
            let idx = (y as usize * width + x as usize) * 3;
            pixels[idx..idx + 3].copy_from_slice(&BOX_COLOR);
        }
    }
}
