use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::alerting::domain::evidence_encoder::EvidenceEncoder;
use crate::shared::constants::DEFAULT_JPEG_QUALITY;
use crate::shared::frame::Frame;

/// Encodes evidence frames as JPEG with the `image` crate.
pub struct JpegEvidenceEncoder {
    quality: u8,
}

impl JpegEvidenceEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegEvidenceEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl EvidenceEncoder for JpegEvidenceEncoder {
    fn content_type(&self) -> &'static str {
        "image/jpeg"
    }

    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let color = match frame.channels() {
            1 => ExtendedColorType::L8,
            3 => ExtendedColorType::Rgb8,
            n => return Err(format!("Unsupported channel count for JPEG: {n}").into()),
        };
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.quality).encode(
            frame.data(),
            frame.width(),
            frame.height(),
            color,
        )?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_decodable_jpeg() {
        let mut data = vec![0u8; 32 * 16 * 3];
        for px in data.chunks_exact_mut(3) {
            px.copy_from_slice(&[200, 40, 40]);
        }
        let frame = Frame::new(data, 32, 16, 3, 0);

        let bytes = JpegEvidenceEncoder::default().encode(&frame).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (32, 16));
        let p = decoded.get_pixel(16, 8);
        assert!(p[0] > 150 && p[1] < 90);
    }

    #[test]
    fn test_rejects_unsupported_channels() {
        let frame = Frame::new(vec![0u8; 4 * 4 * 4], 4, 4, 4, 0);
        assert!(JpegEvidenceEncoder::default().encode(&frame).is_err());
    }
}
