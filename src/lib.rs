//! footfall - zone-crossing people counter for video streams
//!
//! The pipeline reads a video frame by frame, runs a person detector,
//! decodes the raw model output into pixel-space boxes, suppresses
//! redundant overlaps, classifies each surviving person box as
//! entering or exiting against a horizontal zone boundary, accumulates
//! a running tally, draws the surviving boxes, and persists the
//! annotated frames.
//!
//! Stage boundaries:
//! - [`detect::DetectorBackend`] wraps the model: frame in, raw
//!   per-anchor predictions out. Swappable and scriptable in tests.
//! - [`detect::decode`] turns raw predictions into [`detect::Detection`]s
//!   above the confidence threshold.
//! - [`detect::suppress`] is greedy NMS over one frame's detections.
//! - [`count::ZoneCounter`] turns surviving person boxes into
//!   [`count::Crossing`] events and feeds [`count::RunningTally`].
//! - [`annotate`] draws boxes; it is presentational and infallible.
//! - [`pipeline::Pipeline`] owns the source, sink, backend, and tally,
//!   and drives the whole run to a final [`pipeline::Report`].
//!
//! Error posture: opening the source, sink, model, or labels is fatal
//! before the first frame; after that, detector and decode failures
//! are absorbed at the frame boundary so one bad frame never corrupts
//! the tally or aborts the run. Only sink/source I/O failures end a
//! run early.

pub mod annotate;
pub mod config;
pub mod count;
pub mod detect;
pub mod frame;
pub mod pipeline;
pub mod video;

pub use config::{DetectSettings, FootfallConfig, ModelSettings};
pub use count::{Crossing, RunningTally, ZoneCounter};
pub use detect::{decode, suppress, Detection, DetectorBackend, Labels, RawPrediction};
pub use frame::Frame;
pub use pipeline::{Pipeline, Report};
pub use video::{FrameSink, SourceConfig, VideoSource};
