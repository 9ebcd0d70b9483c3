//! Owned frame container.
//!
//! Frames are packed RGB24: `width * height * 3` bytes, row-major,
//! no padding. Sources normalize whatever their decoder produces into
//! this layout before frames enter the pipeline; every downstream
//! stage (detection, counting, annotation) works on this one shape.

use anyhow::{anyhow, Result};

/// One decoded video frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    /// 0-based arrival order within the run.
    index: u64,
}

impl Frame {
    /// Create a frame from packed RGB24 bytes. Called by sources.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, index: u64) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
            index,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable pixel access for the annotator.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Raw byte length, for buffer bookkeeping.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        assert!(Frame::new(vec![0u8; 11], 2, 2, 0).is_err());
        assert!(Frame::new(vec![0u8; 12], 2, 2, 0).is_ok());
    }

    #[test]
    fn reports_dimensions() {
        let frame = Frame::new(vec![0u8; 4 * 3 * 3], 4, 3, 7).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.byte_len(), 36);
    }
}
