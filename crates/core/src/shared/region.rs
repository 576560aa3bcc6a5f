/// Axis-aligned rectangle in frame pixel coordinates.
///
/// Used both for motion blobs and for detector output. Coordinates are
/// clamped to the frame when built from detector corners, so `x + width`
/// never exceeds the frame width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from floating-point corners, rounding outward and
    /// clamping to `[0, frame_w] x [0, frame_h]`.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, frame_w: u32, frame_h: u32) -> Self {
        let fw = frame_w as f64;
        let fh = frame_h as f64;
        let left = x1.min(x2).floor().clamp(0.0, fw);
        let top = y1.min(y2).floor().clamp(0.0, fh);
        let right = x1.max(x2).ceil().clamp(0.0, fw);
        let bottom = y1.max(y2).ceil().clamp(0.0, fh);
        Self {
            x: left as i32,
            y: top as i32,
            width: (right - left) as i32,
            height: (bottom - top) as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: i32, y: i32, w: i32, h: i32) -> BoundingBox {
        BoundingBox::new(x, y, w, h)
    }

    #[test]
    fn test_from_corners_inside_frame() {
        let b = BoundingBox::from_corners(10.2, 20.7, 50.5, 80.1, 640, 480);
        assert_eq!(b, bbox(10, 20, 41, 61));
    }

    #[test]
    fn test_from_corners_clamps_to_frame() {
        let b = BoundingBox::from_corners(-15.0, -5.0, 700.0, 500.0, 640, 480);
        assert_eq!(b, bbox(0, 0, 640, 480));
    }

    #[test]
    fn test_from_corners_swapped_order() {
        let b = BoundingBox::from_corners(50.0, 60.0, 10.0, 20.0, 640, 480);
        assert_eq!(b, bbox(10, 20, 40, 40));
    }
}
