use crate::shared::frame::Frame;

/// Produces frames from a live camera or a recorded video.
///
/// `Ok(None)` marks the end of the stream and ends a session the same way a
/// quit request does. An `Err` is an acquisition failure.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the underlying device or file.
    fn close(&mut self) {}
}
