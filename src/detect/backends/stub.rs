use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::detect::backend::{DetectorBackend, RawPrediction};
use crate::frame::Frame;

/// Stub backend for demo runs without a model.
///
/// Emits a single synthetic person-class prediction whose vertical
/// position oscillates between the top and bottom half of the frame,
/// so a stub run exercises both counters. Class 0 is the person class
/// in the stub vocabulary.
pub struct StubBackend {
    calls: u64,
}

impl StubBackend {
    pub fn new() -> Self {
        Self { calls: 0 }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn forward(&mut self, _frame: &Frame) -> Result<Vec<RawPrediction>> {
        let cy = if self.calls % 2 == 0 { 0.25 } else { 0.75 };
        self.calls += 1;
        Ok(vec![RawPrediction {
            cx: 0.5,
            cy,
            w: 0.1,
            h: 0.3,
            scores: vec![0.9],
        }])
    }
}

/// One scripted detector outcome.
#[derive(Clone, Debug)]
pub enum ScriptedCall {
    /// Return these predictions for the frame.
    Emit(Vec<RawPrediction>),
    /// Fail the frame with this message.
    Fail(String),
}

/// Test backend replaying a fixed per-frame script.
///
/// Frames past the end of the script yield no predictions. Used by the
/// integration tests to drive the pipeline through exact detection
/// sequences, including injected detector failures, without a model.
pub struct ScriptedBackend {
    script: VecDeque<ScriptedCall>,
}

impl ScriptedBackend {
    pub fn new<I: IntoIterator<Item = ScriptedCall>>(script: I) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn forward(&mut self, _frame: &Frame) -> Result<Vec<RawPrediction>> {
        match self.script.pop_front() {
            Some(ScriptedCall::Emit(preds)) => Ok(preds),
            Some(ScriptedCall::Fail(message)) => Err(anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(vec![0u8; 16 * 16 * 3], 16, 16, 0).unwrap()
    }

    #[test]
    fn stub_alternates_halves() {
        let mut backend = StubBackend::new();
        let first = backend.forward(&frame()).unwrap();
        let second = backend.forward(&frame()).unwrap();
        assert!(first[0].cy < 0.5);
        assert!(second[0].cy > 0.5);
    }

    #[test]
    fn scripted_replays_then_goes_quiet() {
        let mut backend = ScriptedBackend::new([
            ScriptedCall::Emit(vec![]),
            ScriptedCall::Fail("camera unplugged".into()),
        ]);
        assert!(backend.forward(&frame()).unwrap().is_empty());
        assert!(backend.forward(&frame()).is_err());
        assert!(backend.forward(&frame()).unwrap().is_empty());
    }
}
