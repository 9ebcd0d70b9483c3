//! FFmpeg-backed video file source.
//!
//! Decodes a local video file frame by frame, scaling everything to
//! packed RGB24. End-of-stream drains the decoder and then yields
//! `None`; it is a normal outcome, not an error.

use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;

use super::source::{SourceConfig, SourceStats};
use crate::frame::Frame;

pub(crate) struct FfmpegSource {
    config: SourceConfig,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    frame_count: u64,
    eof_sent: bool,
}

impl FfmpegSource {
    pub(crate) fn open(config: SourceConfig) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&config.path)
            .with_context(|| format!("failed to open video file '{}'", config.path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow::anyhow!("'{}' has no video track", config.path))?;
        let stream_index = input_stream.index();
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        log::info!(
            "VideoSource: opened {} ({}x{}, ffmpeg)",
            config.path,
            decoder.width(),
            decoder.height()
        );

        Ok(Self {
            config,
            input,
            stream_index,
            decoder,
            scaler,
            frame_count: 0,
            eof_sent: false,
        })
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        let mut rgb_frame = ffmpeg::frame::Video::empty();

        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                self.scaler
                    .run(&decoded, &mut rgb_frame)
                    .context("scale frame to RGB")?;
                let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;
                let index = self.frame_count;
                self.frame_count += 1;
                return Ok(Some(Frame::new(pixels, width, height, index)?));
            }

            if self.eof_sent {
                // Decoder fully drained.
                return Ok(None);
            }

            // Feed the next video packet, or signal EOF to start the
            // drain.
            let stream_index = self.stream_index;
            match self
                .input
                .packets()
                .find(|(stream, _)| stream.index() == stream_index)
            {
                Some((_, packet)) => {
                    self.decoder
                        .send_packet(&packet)
                        .context("send packet to ffmpeg decoder")?;
                }
                None => {
                    self.decoder
                        .send_eof()
                        .context("signal end-of-stream to ffmpeg decoder")?;
                    self.eof_sent = true;
                }
            }
        }
    }

    pub(crate) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            path: self.config.path.clone(),
        }
    }
}

/// Copy an RGB24 ffmpeg frame into a packed buffer, honoring the
/// source stride.
fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0) as usize;
    let data = frame.data(0);

    if stride == row_bytes {
        return Ok((data.to_vec(), width, height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok((pixels, width, height))
}
