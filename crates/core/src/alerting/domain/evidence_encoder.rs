use crate::shared::frame::Frame;

/// Turns an evidence frame into attachment bytes.
pub trait EvidenceEncoder: Send + Sync {
    /// MIME type of the produced bytes.
    fn content_type(&self) -> &'static str;

    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
}
