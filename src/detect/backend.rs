use anyhow::Result;

use crate::frame::Frame;

/// One raw candidate from the detector's output grid.
///
/// Geometry is center-based and normalized to [0,1] relative to the
/// frame; `scores` holds one confidence per class in the label
/// vocabulary's order. Decoding into pixel-space boxes happens in
/// [`crate::detect::decode`], not here.
#[derive(Clone, Debug)]
pub struct RawPrediction {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
    pub scores: Vec<f32>,
}

/// Detector backend trait.
///
/// Implementations wrap a concrete model/runtime behind the one
/// operation the pipeline needs: given a frame, produce the raw
/// per-anchor predictions. The pipeline never sees tensors, model
/// files, or runtime handles, so backends are swappable and tests can
/// script detector behavior without real inference.
pub trait DetectorBackend: Send {
    /// Backend identifier, used in logs and config.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    ///
    /// A returned error means this frame produced no usable output;
    /// the pipeline skips the frame and continues (it is not fatal).
    fn forward(&mut self, frame: &Frame) -> Result<Vec<RawPrediction>>;

    /// Optional warm-up hook, called once before the first frame.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
