//! Video I/O: frame sources and annotated-frame sinks.
//!
//! Sources yield frames strictly in stream order and signal
//! end-of-stream with `Ok(None)`. Sinks receive annotated frames in
//! the same order. Both are exclusively owned by the pipeline driver
//! for the duration of a run.

#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod ffmpeg;
pub mod sink;
pub mod source;

pub use sink::FrameSink;
pub use source::{SourceConfig, SourceStats, VideoSource};
