//! Video frame sources.
//!
//! A source yields decoded frames one at a time, strictly in stream
//! order; `Ok(None)` signals end-of-stream and is not an error. Two
//! backends exist: a synthetic source for `stub://` paths (tests and
//! demo runs, always compiled) and an FFmpeg-backed file decoder
//! behind the `ingest-file-ffmpeg` feature.

use anyhow::{anyhow, Result};

#[cfg(feature = "ingest-file-ffmpeg")]
use super::ffmpeg::FfmpegSource;
use crate::frame::Frame;

/// Configuration for a video source.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Local file path, or `stub://<name>` for the synthetic source.
    pub path: String,
    /// Nominal frame rate, forwarded to the sink for output pacing.
    pub target_fps: u32,
    /// Synthetic source only: number of frames before end-of-stream.
    pub stub_frames: u64,
    /// Synthetic source only: frame dimensions.
    pub stub_width: u32,
    pub stub_height: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            target_fps: 20,
            stub_frames: 100,
            stub_width: 640,
            stub_height: 480,
        }
    }
}

/// A video frame source.
pub struct VideoSource {
    backend: SourceBackend,
}

enum SourceBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegSource),
}

impl VideoSource {
    /// Open a source. Failure here is fatal to the run: nothing has
    /// been counted yet.
    pub fn open(config: SourceConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "video ingestion only supports local paths (no URL schemes)"
            ));
        }
        if config.path.starts_with("stub://") {
            Ok(Self {
                backend: SourceBackend::Synthetic(SyntheticSource::new(config)),
            })
        } else {
            #[cfg(feature = "ingest-file-ffmpeg")]
            {
                Ok(Self {
                    backend: SourceBackend::Ffmpeg(FfmpegSource::open(config)?),
                })
            }
            #[cfg(not(feature = "ingest-file-ffmpeg"))]
            {
                Err(anyhow!(
                    "video file ingestion requires the ingest-file-ffmpeg feature"
                ))
            }
        }
    }

    /// Pull the next frame. `Ok(None)` is end-of-stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            SourceBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            SourceBackend::Ffmpeg(source) => source.next_frame(),
        }
    }

    pub fn stats(&self) -> SourceStats {
        match &self.backend {
            SourceBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            SourceBackend::Ffmpeg(source) => source.stats(),
        }
    }
}

/// Statistics for a video source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub path: String,
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and demo runs
// ----------------------------------------------------------------------------

struct SyntheticSource {
    config: SourceConfig,
    frame_count: u64,
}

impl SyntheticSource {
    fn new(config: SourceConfig) -> Self {
        log::info!(
            "VideoSource: opened {} (synthetic, {} frame(s))",
            config.path,
            config.stub_frames
        );
        Self {
            config,
            frame_count: 0,
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.frame_count >= self.config.stub_frames {
            return Ok(None);
        }
        let index = self.frame_count;
        self.frame_count += 1;

        let width = self.config.stub_width;
        let height = self.config.stub_height;
        let mut pixels = vec![0u8; (width * height * 3) as usize];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + index) % 256) as u8;
        }
        Ok(Some(Frame::new(pixels, width, height, index)?))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            path: self.config.path.clone(),
        }
    }
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_source_ends_after_configured_frames() {
        let mut source = VideoSource::open(SourceConfig {
            path: "stub://clip".into(),
            stub_frames: 3,
            stub_width: 8,
            stub_height: 8,
            ..SourceConfig::default()
        })
        .unwrap();
        for expected in 0..3u64 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.index(), expected);
            assert_eq!(frame.width(), 8);
        }
        assert!(source.next_frame().unwrap().is_none());
        // End-of-stream is sticky, not an error.
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.stats().frames_captured, 3);
    }

    #[test]
    fn zero_frame_source_is_empty_not_an_error() {
        let mut source = VideoSource::open(SourceConfig {
            path: "stub://empty".into(),
            stub_frames: 0,
            ..SourceConfig::default()
        })
        .unwrap();
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn rejects_url_schemes() {
        assert!(VideoSource::open(SourceConfig {
            path: "rtsp://camera".into(),
            ..SourceConfig::default()
        })
        .is_err());
        assert!(VideoSource::open(SourceConfig {
            path: String::new(),
            ..SourceConfig::default()
        })
        .is_err());
    }
}
