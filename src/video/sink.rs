//! Annotated frame sinks.
//!
//! A sink receives annotated frames in arrival order and persists (or
//! discards) them. The first written frame fixes the expected
//! resolution; a later mismatch is a fatal I/O error, since the output
//! stream must keep the source's first-frame dimensions. Sinks carry
//! the nominal frame rate for output pacing metadata.

use anyhow::{anyhow, Result};
#[cfg(feature = "sink-image")]
use std::path::PathBuf;

use crate::frame::Frame;

/// A frame sink.
pub struct FrameSink {
    backend: SinkBackend,
    fps: u32,
    expected: Option<(u32, u32)>,
    frames_written: u64,
    finished: bool,
}

enum SinkBackend {
    /// Discard frames (counting-only runs).
    Null,
    /// Record (index, width, height) of each written frame. Test
    /// fixture for asserting output order and dimensions.
    Collect(Vec<(u64, u32, u32)>),
    /// Numbered JPEG files in a directory.
    #[cfg(feature = "sink-image")]
    ImageDir(PathBuf),
}

impl FrameSink {
    pub fn null(fps: u32) -> Self {
        Self::new(SinkBackend::Null, fps)
    }

    pub fn collecting(fps: u32) -> Self {
        Self::new(SinkBackend::Collect(Vec::new()), fps)
    }

    /// Open a directory sink writing `frame_NNNNNN.jpg` files.
    #[cfg(feature = "sink-image")]
    pub fn image_dir<P: Into<PathBuf>>(dir: P, fps: u32) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| anyhow!("failed to create output directory {}: {}", dir.display(), e))?;
        log::info!(
            "FrameSink: writing annotated frames to {} ({} fps nominal)",
            dir.display(),
            fps
        );
        Ok(Self::new(SinkBackend::ImageDir(dir), fps))
    }

    fn new(backend: SinkBackend, fps: u32) -> Self {
        Self {
            backend,
            fps,
            expected: None,
            frames_written: 0,
            finished: false,
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Frames recorded by a collecting sink, in write order.
    pub fn written(&self) -> &[(u64, u32, u32)] {
        match &self.backend {
            SinkBackend::Collect(frames) => frames,
            _ => &[],
        }
    }

    /// Write one annotated frame.
    pub fn write(&mut self, frame: &Frame) -> Result<()> {
        if self.finished {
            return Err(anyhow!("sink already finished"));
        }
        let dims = (frame.width(), frame.height());
        match self.expected {
            None => self.expected = Some(dims),
            Some(expected) if expected != dims => {
                return Err(anyhow!(
                    "frame {} is {}x{}, output stream is {}x{}",
                    frame.index(),
                    dims.0,
                    dims.1,
                    expected.0,
                    expected.1
                ));
            }
            Some(_) => {}
        }

        match &mut self.backend {
            SinkBackend::Null => {}
            SinkBackend::Collect(frames) => frames.push((frame.index(), dims.0, dims.1)),
            #[cfg(feature = "sink-image")]
            SinkBackend::ImageDir(dir) => {
                let path = dir.join(format!("frame_{:06}.jpg", frame.index()));
                let buffer: image::RgbImage = image::ImageBuffer::from_raw(
                    frame.width(),
                    frame.height(),
                    frame.pixels().to_vec(),
                )
                .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;
                buffer
                    .save_with_format(&path, image::ImageFormat::Jpeg)
                    .map_err(|e| anyhow!("failed to write {}: {}", path.display(), e))?;
            }
        }
        self.frames_written += 1;
        Ok(())
    }

    /// Flush and close the sink. Idempotent.
    pub fn finish(&mut self) -> Result<()> {
        if !self.finished {
            self.finished = true;
            log::debug!("FrameSink: finished after {} frame(s)", self.frames_written);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u64, width: u32, height: u32) -> Frame {
        Frame::new(vec![0u8; (width * height * 3) as usize], width, height, index).unwrap()
    }

    #[test]
    fn collect_sink_preserves_order() {
        let mut sink = FrameSink::collecting(20);
        for i in 0..4 {
            sink.write(&frame(i, 8, 8)).unwrap();
        }
        sink.finish().unwrap();
        let indices: Vec<u64> = sink.written().iter().map(|f| f.0).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(sink.frames_written(), 4);
    }

    #[test]
    fn resolution_is_fixed_by_first_frame() {
        let mut sink = FrameSink::null(20);
        sink.write(&frame(0, 8, 8)).unwrap();
        assert!(sink.write(&frame(1, 16, 8)).is_err());
    }

    #[test]
    fn writing_after_finish_fails() {
        let mut sink = FrameSink::null(20);
        sink.finish().unwrap();
        sink.finish().unwrap();
        assert!(sink.write(&frame(0, 8, 8)).is_err());
    }
}
