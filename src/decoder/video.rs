use anyhow::{anyhow, bail, Result};
use opencv::{core, imgproc, prelude::*, videoio};
use std::path::Path;

use super::frame_data::{ChannelOrder, FrameData};
use super::{FrameSource, VideoOpener};
use crate::utils::logger;

/// OpenCV-backed video source. Frames come out in OpenCV's native BGR order.
pub struct VideoDecoder {
    capture: videoio::VideoCapture,
    path: String,
    frame_count_hint: u64,
}

impl VideoDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("video path is not valid UTF-8: {}", path.display()))?;

        logger::debug(&format!("Opening video with OpenCV: {}", path_str));

        // CAP_ANY lets OpenCV pick the backend (FFmpeg, GStreamer, AVFoundation, MSMF)
        let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            let err_msg = format!("Could not open video {}", path_str);
            logger::error(&err_msg);
            return Err(anyhow!(err_msg));
        }

        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        let frame_count_hint = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;

        logger::debug(&format!(
            "VideoCapture opened: {}x{} @ {:.2} fps, ~{} frames",
            width, height, fps, frame_count_hint
        ));

        Ok(Self {
            capture,
            path: path_str.to_string(),
            frame_count_hint,
        })
    }
}

impl FrameSource for VideoDecoder {
    fn read_frame(&mut self) -> Result<Option<FrameData>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? {
            return Ok(None); // EOF
        }
        if frame.empty() {
            return Ok(None);
        }

        if frame.typ() != core::CV_8UC3 {
            bail!("unsupported frame layout (type {}), expected 8-bit BGR", frame.typ());
        }
        if !frame.is_continuous() {
            bail!("Frame is not continuous");
        }

        let width = frame.cols() as u32;
        let height = frame.rows() as u32;
        let bytes = frame.data_bytes()?.to_vec();

        FrameData::new(bytes, width, height, ChannelOrder::Bgr)
    }

    fn rgb_view(&self, frame: &FrameData) -> Result<FrameData> {
        bgr_to_rgb(frame)
    }

    fn frame_count_hint(&self) -> Option<u64> {
        (self.frame_count_hint > 0).then_some(self.frame_count_hint)
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            logger::error(&format!("Failed to release {}: {}", self.path, e));
        } else {
            logger::debug(&format!("Released video {}", self.path));
        }
    }
}

/// Converts a packed BGR frame to RGB with OpenCV. RGB input is returned as is.
pub fn bgr_to_rgb(frame: &FrameData) -> Result<FrameData> {
    if frame.order == ChannelOrder::Rgb {
        return Ok(frame.clone());
    }

    let flat = Mat::from_slice(&frame.buffer)?;
    let bgr = flat.reshape(3, frame.height as i32)?;
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB)?;

    if !rgb.is_continuous() {
        bail!("Converted frame is not continuous");
    }
    FrameData::new(rgb.data_bytes()?.to_vec(), frame.width, frame.height, ChannelOrder::Rgb)
}

/// Opens files through [`VideoDecoder`].
pub struct OpenCvOpener;

impl VideoOpener for OpenCvOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(VideoDecoder::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgr_to_rgb_swaps_blue_and_red() {
        let frame = FrameData::new(vec![1, 2, 3, 10, 20, 30], 2, 1, ChannelOrder::Bgr).unwrap();
        let rgb = bgr_to_rgb(&frame).unwrap();
        assert_eq!(rgb.order, ChannelOrder::Rgb);
        assert_eq!((rgb.width, rgb.height), (2, 1));
        assert_eq!(rgb.buffer, vec![3, 2, 1, 30, 20, 10]);
    }

    #[test]
    fn test_bgr_to_rgb_keeps_rgb_input() {
        let frame = FrameData::new(vec![1, 2, 3], 1, 1, ChannelOrder::Rgb).unwrap();
        assert_eq!(bgr_to_rgb(&frame).unwrap().buffer, vec![1, 2, 3]);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let path = std::env::temp_dir().join("motion_extract_test_missing_video.mp4");
        let _ = std::fs::remove_file(&path);
        assert!(VideoDecoder::open(&path).is_err());
    }
}
