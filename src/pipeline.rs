//! Pipeline driver.
//!
//! Sequences the run over the whole video: pull frame, detect, decode,
//! suppress, count, annotate, emit. Frames are processed exactly once,
//! strictly in arrival order, synchronously. The driver exclusively
//! owns the source and sink and is the only owner of the running
//! tally; counters are mutated only in a completed frame's counting
//! step, so stopping between frames always leaves a consistent total.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Context, Result};

use crate::annotate;
use crate::config::DetectSettings;
use crate::count::{RunningTally, ZoneCounter};
use crate::detect::decode::{decode, Detection};
use crate::detect::labels::Labels;
use crate::detect::nms::suppress;
use crate::detect::DetectorBackend;
use crate::frame::Frame;
use crate::video::{FrameSink, VideoSource};

/// Final totals of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub entered: u64,
    pub exited: u64,
    /// Frames that completed the full detect-count-emit path.
    pub frames_processed: u64,
    /// Frames skipped because the detector failed; they carry no
    /// detections and never touch the tally.
    pub frames_skipped: u64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entered={} exited={} frames={} skipped={}",
            self.entered, self.exited, self.frames_processed, self.frames_skipped
        )
    }
}

/// The per-video counting pipeline.
pub struct Pipeline {
    source: VideoSource,
    sink: FrameSink,
    backend: Box<dyn DetectorBackend>,
    detect: DetectSettings,
    counter: ZoneCounter,
    tally: RunningTally,
    frames_processed: u64,
    frames_skipped: u64,
}

impl Pipeline {
    /// Assemble a pipeline. This is the Init step: the target class is
    /// resolved against the vocabulary and the backend warmed up, all
    /// before the first frame. Failures here are fatal and nothing has
    /// been counted.
    pub fn new(
        source: VideoSource,
        sink: FrameSink,
        mut backend: Box<dyn DetectorBackend>,
        labels: &Labels,
        detect: DetectSettings,
    ) -> Result<Self> {
        let target_class = labels.index_of(&detect.target_class).ok_or_else(|| {
            anyhow!(
                "target class '{}' is not in the label vocabulary ({} classes)",
                detect.target_class,
                labels.len()
            )
        })?;
        backend
            .warm_up()
            .with_context(|| format!("failed to warm up detector backend '{}'", backend.name()))?;

        let counter = ZoneCounter::new(target_class, detect.zone_boundary_fraction);
        log::info!(
            "pipeline ready: backend={} target_class='{}' (id {}) confidence>{} iou<={} boundary={}",
            backend.name(),
            detect.target_class,
            target_class,
            detect.confidence_threshold,
            detect.iou_threshold,
            detect.zone_boundary_fraction
        );

        Ok(Self {
            source,
            sink,
            backend,
            detect,
            counter,
            tally: RunningTally::default(),
            frames_processed: 0,
            frames_skipped: 0,
        })
    }

    /// Current totals. Consistent between frames.
    pub fn tally(&self) -> RunningTally {
        self.tally
    }

    /// The sink, for inspecting what a run emitted.
    pub fn sink(&self) -> &FrameSink {
        &self.sink
    }

    /// Run until end-of-stream, a fatal I/O error, or the stop flag.
    ///
    /// The sink is finished on every exit path.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<Report> {
        let outcome = self.run_frames(stop);
        let finish = self.sink.finish();
        let report = outcome?;
        finish?;
        Ok(report)
    }

    fn run_frames(&mut self, stop: &AtomicBool) -> Result<Report> {
        loop {
            // The stop flag is only consulted between frames, so a
            // stop never interrupts a half-counted frame.
            if stop.load(Ordering::Relaxed) {
                log::info!("stop requested, ending run at frame {}", self.frame_total());
                break;
            }

            let Some(mut frame) = self.source.next_frame().context("video source failed")? else {
                break;
            };

            match self.detect_frame(&frame) {
                Ok(detections) => {
                    let keep = suppress(
                        &detections,
                        self.detect.iou_threshold,
                        self.detect.confidence_threshold,
                    );
                    let survivors: Vec<&Detection> =
                        keep.iter().map(|&i| &detections[i]).collect();

                    self.counter
                        .count_frame(&survivors, frame.height(), &mut self.tally);
                    annotate::draw_detections(&mut frame, &survivors);
                    self.frames_processed += 1;
                }
                Err(e) => {
                    // Detector errors are frame-local: the frame is
                    // emitted unannotated and the tally is untouched.
                    log::warn!("frame {}: detector failed, skipping: {:#}", frame.index(), e);
                    self.frames_skipped += 1;
                }
            }

            self.sink
                .write(&frame)
                .context("video sink failed")?;

            if self.frame_total() % 100 == 0 {
                log::debug!(
                    "progress: {} frame(s), tally {}/{}",
                    self.frame_total(),
                    self.tally.entered,
                    self.tally.exited
                );
            }
        }

        let stats = self.source.stats();
        log::info!(
            "run complete: {} frame(s) from {}, entered={} exited={}",
            stats.frames_captured,
            stats.path,
            self.tally.entered,
            self.tally.exited
        );

        Ok(Report {
            entered: self.tally.entered,
            exited: self.tally.exited,
            frames_processed: self.frames_processed,
            frames_skipped: self.frames_skipped,
        })
    }

    /// Detecting step: backend forward pass plus box decoding.
    fn detect_frame(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let preds = self.backend.forward(frame)?;
        Ok(decode(
            &preds,
            frame.width(),
            frame.height(),
            self.detect.confidence_threshold,
        ))
    }

    fn frame_total(&self) -> u64 {
        self.frames_processed + self.frames_skipped
    }
}
