use crate::shared::frame::Frame;
use crate::shared::video_metadata::{FrameSource, VideoMetadata};

/// Reads frames from a recorded file or a live capture device.
///
/// Implementations handle codec and device details while the tracking
/// pipeline works with the abstract `Frame` and `VideoMetadata` types.
/// Iteration ending is the end-of-stream signal for a session.
pub trait VideoReader: Send {
    /// Opens the source and returns its metadata.
    fn open(&mut self, source: &FrameSource) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in capture order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the reader.
    fn close(&mut self);
}
