use crate::shared::frame::Frame;

use super::detection::Detection;

/// Domain interface for the object classifier.
///
/// Only detections with confidence at or above `confidence` are returned.
/// Implementations hold a model session, hence `&mut self`.
pub trait ObjectDetector: Send {
    fn infer(
        &mut self,
        frame: &Frame,
        confidence: f64,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
