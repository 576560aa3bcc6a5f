use crate::motion::domain::gray_frame::GrayFrame;
use crate::motion::domain::motion_gate::{MotionGate, MotionReading};
use crate::motion::domain::motion_status::MotionStatus;
use crate::shared::constants::{
    DEFAULT_BLUR_KERNEL, DEFAULT_DIFF_THRESHOLD, DEFAULT_DILATE_ITERATIONS,
    DEFAULT_MIN_MOTION_AREA,
};
use crate::shared::frame::Frame;

use super::gaussian::{blur_gray_with_kernel, gaussian_kernel_1d};
use super::mask_ops::{dilate, find_blobs, threshold_difference};

/// Tuning for [`BackgroundDifferenceGate`].
#[derive(Clone, Debug, PartialEq)]
pub struct MotionGateConfig {
    /// Per-pixel absolute difference above which a pixel counts as changed.
    pub diff_threshold: u8,
    /// Odd Gaussian kernel size used to suppress sensor noise.
    pub blur_kernel: usize,
    pub dilate_iterations: usize,
    /// Blobs below this pixel area are ignored.
    pub min_area: u32,
}

impl Default for MotionGateConfig {
    fn default() -> Self {
        Self {
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
            blur_kernel: DEFAULT_BLUR_KERNEL,
            dilate_iterations: DEFAULT_DILATE_ITERATIONS,
            min_area: DEFAULT_MIN_MOTION_AREA,
        }
    }
}

/// Motion gate that differences each frame against a fixed background.
///
/// grayscale → blur → |frame - background| → threshold → dilate → blobs.
/// A person already standing still when the background was captured
/// produces no difference and is never gated through.
pub struct BackgroundDifferenceGate {
    config: MotionGateConfig,
    kernel: Vec<f32>,
}

impl BackgroundDifferenceGate {
    pub fn new(config: MotionGateConfig) -> Self {
        let kernel = gaussian_kernel_1d(config.blur_kernel.max(1) | 1);
        Self { config, kernel }
    }

    /// Grayscale + blur, the shared preprocessing for background and frames.
    fn prepare(&self, frame: &Frame) -> GrayFrame {
        let mut gray = to_grayscale(frame);
        let mut temp = Vec::new();
        blur_gray_with_kernel(
            &mut gray,
            frame.width() as usize,
            frame.height() as usize,
            &self.kernel,
            &mut temp,
        );
        GrayFrame::new(gray, frame.width(), frame.height())
    }
}

impl Default for BackgroundDifferenceGate {
    fn default() -> Self {
        Self::new(MotionGateConfig::default())
    }
}

impl MotionGate for BackgroundDifferenceGate {
    fn reference(&self, frame: &Frame) -> GrayFrame {
        self.prepare(frame)
    }

    fn detect(
        &self,
        background: &GrayFrame,
        frame: &Frame,
    ) -> Result<MotionReading, Box<dyn std::error::Error>> {
        let current = self.prepare(frame);
        if !current.same_size(background) {
            return Err(format!(
                "Frame size {}x{} does not match background {}x{}",
                current.width(),
                current.height(),
                background.width(),
                background.height()
            )
            .into());
        }

        let mask = threshold_difference(
            background.as_ndarray(),
            current.as_ndarray(),
            self.config.diff_threshold,
        );
        let mask = dilate(&mask, self.config.dilate_iterations);

        let boxes: Vec<_> = find_blobs(&mask)
            .into_iter()
            .filter(|b| b.area >= self.config.min_area)
            .map(|b| b.bbox)
            .collect();

        let status = if boxes.is_empty() {
            MotionStatus::None
        } else {
            MotionStatus::Motion
        };
        Ok(MotionReading { status, boxes })
    }
}

/// ITU-R BT.601 luma from RGB, the same weights OpenCV uses.
fn to_grayscale(frame: &Frame) -> Vec<u8> {
    let channels = frame.channels() as usize;
    if channels == 1 {
        return frame.data().to_vec();
    }
    frame
        .data()
        .chunks_exact(channels)
        .map(|px| {
            let luma = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
            luma.round().clamp(0.0, 255.0) as u8
        })
        .collect()
}
