#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{DetectorBackend, RawPrediction};
use crate::frame::Frame;

/// Tract-based backend for ONNX inference.
///
/// Loads a local YOLO-style model and maps its output rows to raw
/// predictions. Expected row layout: `[cx, cy, w, h, objectness,
/// class scores...]`, all geometry normalized to [0,1]; class scores
/// are read from offset 5 and objectness is not applied. Frames are
/// resampled to the model's input size before inference; predictions
/// stay in normalized coordinates, so downstream decoding uses the
/// original frame dimensions.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    input_width: u32,
    input_height: u32,
}

/// Columns preceding the class scores in a YOLO output row.
const CLASS_SCORE_OFFSET: usize = 5;

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_width: u32, input_height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_height as usize, input_width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_width,
            input_height,
        })
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        let src_w = frame.width() as usize;
        let src_h = frame.height() as usize;
        if src_w == 0 || src_h == 0 {
            return Err(anyhow!("cannot run inference on an empty frame"));
        }

        let dst_w = self.input_width as usize;
        let dst_h = self.input_height as usize;
        let pixels = frame.pixels();

        // Nearest-neighbor resample to the model input size, scaled
        // to [0,1] NCHW.
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, dst_h, dst_w),
            |(_, channel, y, x)| {
                let sx = x * src_w / dst_w;
                let sy = y * src_h / dst_h;
                let idx = (sy * src_w + sx) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn parse_outputs(&self, outputs: TVec<TValue>) -> Result<Vec<RawPrediction>> {
        let mut preds = Vec::new();
        for output in outputs.iter() {
            let view = output
                .to_array_view::<f32>()
                .context("model output tensor was not f32")?;
            let Some(&row_len) = view.shape().last() else {
                continue;
            };
            if row_len <= CLASS_SCORE_OFFSET {
                return Err(anyhow!(
                    "model output rows have {} columns, expected more than {}",
                    row_len,
                    CLASS_SCORE_OFFSET
                ));
            }
            let flat: Vec<f32> = view.iter().copied().collect();
            for row in flat.chunks_exact(row_len) {
                preds.push(RawPrediction {
                    cx: row[0],
                    cy: row[1],
                    w: row[2],
                    h: row[3],
                    scores: row[CLASS_SCORE_OFFSET..].to_vec(),
                });
            }
        }
        Ok(preds)
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn forward(&mut self, frame: &Frame) -> Result<Vec<RawPrediction>> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.parse_outputs(outputs)
    }
}
