use ndarray::{Array2, ArrayView2};

use crate::shared::region::BoundingBox;

/// A connected foreground region of a binary mask.
#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    /// Number of foreground pixels in the region.
    pub area: u32,
    pub bbox: BoundingBox,
}

/// Marks pixels whose absolute difference exceeds `threshold`.
pub fn threshold_difference(
    background: ArrayView2<'_, u8>,
    current: ArrayView2<'_, u8>,
    threshold: u8,
) -> Array2<bool> {
    debug_assert_eq!(background.shape(), current.shape());
    Array2::from_shape_fn(current.raw_dim(), |idx| {
        background[idx].abs_diff(current[idx]) > threshold
    })
}

/// Dilates a mask with a 3x3 square structuring element.
///
/// Pixels outside the mask never contribute.
pub fn dilate(mask: &Array2<bool>, iterations: usize) -> Array2<bool> {
    let (h, w) = mask.dim();
    let mut current = mask.clone();
    for _ in 0..iterations {
        current = Array2::from_shape_fn((h, w), |(y, x)| {
            let y0 = y.saturating_sub(1);
            let x0 = x.saturating_sub(1);
            let y1 = (y + 1).min(h - 1);
            let x1 = (x + 1).min(w - 1);
            (y0..=y1).any(|yy| (x0..=x1).any(|xx| current[[yy, xx]]))
        });
    }
    current
}

/// Extracts 8-connected foreground regions.
///
/// Blobs come out in raster order of their first pixel.
pub fn find_blobs(mask: &Array2<bool>) -> Vec<Blob> {
    let (h, w) = mask.dim();
    let mut visited = Array2::<bool>::from_elem((h, w), false);
    let mut blobs = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if !mask[[y, x]] || visited[[y, x]] {
                continue;
            }

            visited[[y, x]] = true;
            stack.push((y, x));
            let mut area = 0u32;
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);

            while let Some((cy, cx)) = stack.pop() {
                area += 1;
                min_x = min_x.min(cx);
                max_x = max_x.max(cx);
                min_y = min_y.min(cy);
                max_y = max_y.max(cy);

                for ny in cy.saturating_sub(1)..=(cy + 1).min(h - 1) {
                    for nx in cx.saturating_sub(1)..=(cx + 1).min(w - 1) {
                        if mask[[ny, nx]] && !visited[[ny, nx]] {
                            visited[[ny, nx]] = true;
                            stack.push((ny, nx));
                        }
                    }
                }
            }

            blobs.push(Blob {
                area,
                bbox: BoundingBox::new(
                    min_x as i32,
                    min_y as i32,
                    (max_x - min_x + 1) as i32,
                    (max_y - min_y + 1) as i32,
                ),
            });
        }
    }
    blobs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> Array2<bool> {
        let h = rows.len();
        let w = rows[0].len();
        Array2::from_shape_fn((h, w), |(y, x)| rows[y].as_bytes()[x] == b'#')
    }

    #[test]
    fn test_threshold_is_strict() {
        let bg = Array2::from_elem((1, 3), 100u8);
        let cur = Array2::from_shape_vec((1, 3), vec![130u8, 131, 69]).unwrap();
        let mask = threshold_difference(bg.view(), cur.view(), 30);
        assert_eq!(mask.as_slice().unwrap(), &[false, true, true]);
    }

    #[test]
    fn test_dilate_grows_single_pixel() {
        let mask = mask_from(&[".....", ".....", "..#..", ".....", "....."]);
        let once = dilate(&mask, 1);
        assert_eq!(once.iter().filter(|&&v| v).count(), 9);
        let twice = dilate(&mask, 2);
        assert_eq!(twice.iter().filter(|&&v| v).count(), 25);
    }

    #[test]
    fn test_dilate_zero_iterations_is_identity() {
        let mask = mask_from(&["#..", "...", "..#"]);
        assert_eq!(dilate(&mask, 0), mask);
    }

    #[test]
    fn test_find_blobs_separates_regions() {
        let mask = mask_from(&["##....", "##....", "......", "....##", "....##"]);
        let blobs = find_blobs(&mask);
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].area, 4);
        assert_eq!(blobs[0].bbox, BoundingBox::new(0, 0, 2, 2));
        assert_eq!(blobs[1].bbox, BoundingBox::new(4, 3, 2, 2));
    }

    #[test]
    fn test_find_blobs_uses_eight_connectivity() {
        let mask = mask_from(&["#..", ".#.", "..#"]);
        let blobs = find_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].area, 3);
        assert_eq!(blobs[0].bbox, BoundingBox::new(0, 0, 3, 3));
    }

    #[test]
    fn test_find_blobs_empty_mask() {
        let mask = mask_from(&["...", "..."]);
        assert!(find_blobs(&mask).is_empty());
    }
}
