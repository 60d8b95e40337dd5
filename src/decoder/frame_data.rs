use anyhow::{bail, Result};

/// Byte order of the three colour channels in a packed 8-bit frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Bgr,
    Rgb,
}

/// One decoded video frame, tightly packed, 3 bytes per pixel
#[derive(Debug, Clone)]
pub struct FrameData {
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub order: ChannelOrder,
}

impl FrameData {
    pub fn new(buffer: Vec<u8>, width: u32, height: u32, order: ChannelOrder) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if buffer.len() != expected {
            bail!(
                "frame buffer holds {} bytes, expected {} for {}x{}",
                buffer.len(),
                expected,
                width,
                height
            );
        }
        Ok(Self { buffer, width, height, order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_buffer() {
        assert!(FrameData::new(vec![0; 5], 2, 1, ChannelOrder::Bgr).is_err());
    }
}
