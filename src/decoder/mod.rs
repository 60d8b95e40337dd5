pub mod frame_data;
pub mod video;

use anyhow::Result;
use std::path::Path;

pub use frame_data::{ChannelOrder, FrameData};
pub use video::OpenCvOpener;

/// An open, sequential frame source. Dropping it releases the underlying handle.
pub trait FrameSource {
    /// `Ok(None)` at end of stream, `Err` when decoding fails mid-stream.
    fn read_frame(&mut self) -> Result<Option<FrameData>>;

    /// `frame` as the RGB the landmark model expects.
    fn rgb_view(&self, frame: &FrameData) -> Result<FrameData>;

    /// Container-reported frame count, if the backend knows it
    fn frame_count_hint(&self) -> Option<u64> {
        None
    }
}

pub trait VideoOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>>;
}
