use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};

use crate::types::BoundingBox;

/// Copy of `binary` with a one-pixel background border on every side.
///
/// Border following treats a component that starts on the image edge as a
/// hole with no parent, and parents every later outer border to it. With the
/// margin every foreground pixel is interior, so top-level components come
/// back as parentless outer borders.
fn pad_with_background(binary: &GrayImage) -> GrayImage {
    let (width, height) = binary.dimensions();
    let mut padded = GrayImage::new(width + 2, height + 2);
    for (x, y, pixel) in binary.enumerate_pixels() {
        if pixel[0] > 0 {
            padded.put_pixel(x + 1, y + 1, Luma([255u8]));
        }
    }
    padded
}

/// Outer boundaries of top-level foreground components, reduced to boxes.
///
/// Output follows the border-following scan order. Components touching the
/// image border are included; components nested inside a hole of another
/// component are not.
pub fn find_external_contours(binary: &GrayImage) -> Vec<BoundingBox> {
    find_contours::<i32>(&pad_with_background(binary))
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(|contour| {
            let mut points = contour.points.iter();
            let first = points.next()?;
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
            for p in points {
                min_x = min_x.min(p.x);
                min_y = min_y.min(p.y);
                max_x = max_x.max(p.x);
                max_y = max_y.max(p.y);
            }
            // Undo the margin
            if min_x < 1 || min_y < 1 {
                return None;
            }
            Some(BoundingBox::from_extremes(
                (min_x - 1) as u32,
                (min_y - 1) as u32,
                (max_x - 1) as u32,
                (max_y - 1) as u32,
            ))
        })
        .collect()
}

/// Keep boxes strictly larger than `min_width` x `min_height`
pub fn filter_larger_than(boxes: Vec<BoundingBox>, min_width: u32, min_height: u32) -> Vec<BoundingBox> {
    boxes
        .into_iter()
        .filter(|b| b.width > min_width && b.height > min_height)
        .collect()
}
