use crate::shared::frame::Frame;
use crate::shared::region::BoundingBox;

use super::gray_frame::GrayFrame;
use super::motion_status::MotionStatus;

/// Result of gating one frame.
///
/// `boxes` are diagnostic only: they say where motion was seen, not what.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionReading {
    pub status: MotionStatus,
    pub boxes: Vec<BoundingBox>,
}

/// Cheap per-frame filter deciding whether the detector should run.
pub trait MotionGate: Send {
    /// Prepares a frame for use as the fixed reference background.
    fn reference(&self, frame: &Frame) -> GrayFrame;

    /// Compares `frame` against `background`.
    fn detect(
        &self,
        background: &GrayFrame,
        frame: &Frame,
    ) -> Result<MotionReading, Box<dyn std::error::Error>>;
}
