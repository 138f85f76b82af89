//! Straight segment detection.
//!
//! Stage 1 builds a Canny edge map. Stage 2 votes every edge pixel into a
//! (distance, angle) accumulator, keeps the non-maximum-suppressed peaks with
//! enough votes, then walks each peak line across the edge map to cut it into
//! segments. Runs of edge pixels separated by at most `max_gap` pixels are
//! merged; runs shorter than `min_length` are dropped.

use image::GrayImage;
use imageproc::hough::{detect_lines as hough_lines, LineDetectionOptions, PolarLine};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    algorithms::preprocessing::CannyPreprocessor,
    error::Result,
    traits::ImagePreprocessor,
    types::LineSegment,
};

/// Angular band, in degrees, inside which a segment counts as horizontal
pub const HORIZONTAL_TOLERANCE_DEGREES: f32 = 10.0;

/// Thresholds for the edge map and the line-voting stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LineDetectionConfig {
    /// Hysteresis low threshold for the edge map
    pub canny_low: f32,
    /// Hysteresis high threshold for the edge map
    pub canny_high: f32,
    /// Minimum accumulator votes for a line
    pub hough_threshold: u32,
    /// Minimum segment length in pixels
    pub min_length: f32,
    /// Largest gap, in pixels, bridged between collinear runs
    pub max_gap: u32,
    /// Accumulator neighbourhood used for peak suppression
    pub suppression_radius: u32,
    /// Perpendicular distance, in pixels, at which an edge pixel still belongs to a line
    pub band: u32,
}

impl Default for LineDetectionConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            hough_threshold: 50,
            min_length: 50.0,
            max_gap: 10,
            suppression_radius: 8,
            band: 2,
        }
    }
}

/// Canny edge map of a grayscale image
pub fn edge_map(gray: &GrayImage, low: f32, high: f32) -> Result<GrayImage> {
    CannyPreprocessor { low, high }.preprocess(gray)
}

/// Detect line segments in a grayscale or binary image
pub fn detect_lines(gray: &GrayImage, config: &LineDetectionConfig) -> Result<Vec<LineSegment>> {
    let edges = edge_map(gray, config.canny_low, config.canny_high)?;
    Ok(detect_lines_in_edges(&edges, config))
}

/// Run only the voting and tracing stage on a prepared edge map
pub fn detect_lines_in_edges(edges: &GrayImage, config: &LineDetectionConfig) -> Vec<LineSegment> {
    let options = LineDetectionOptions {
        vote_threshold: config.hough_threshold,
        suppression_radius: config.suppression_radius,
    };
    let peaks = hough_lines(edges, options);

    let segments: Vec<LineSegment> = peaks
        .iter()
        .flat_map(|line| trace_segments(edges, line, config))
        .collect();

    debug!(peaks = peaks.len(), segments = segments.len(), "Line voting complete");
    segments
}

/// Number of segments within `tolerance` degrees of horizontal
pub fn count_horizontal(lines: &[LineSegment], tolerance: f32) -> usize {
    lines.iter().filter(|line| line.is_horizontal(tolerance)).count()
}

fn is_edge(edges: &GrayImage, x: i64, y: i64) -> bool {
    x >= 0
        && y >= 0
        && (x as u32) < edges.width()
        && (y as u32) < edges.height()
        && edges.get_pixel(x as u32, y as u32)[0] > 0
}

/// Walk a polar line across the edge map and cut it into segments
fn trace_segments(edges: &GrayImage, line: &PolarLine, config: &LineDetectionConfig) -> Vec<LineSegment> {
    let (width, height) = edges.dimensions();
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();

    // Foot of the normal from the origin, and the direction along the line
    let (x0, y0) = (line.r * cos, line.r * sin);
    let (dx, dy) = (-sin, cos);
    let reach = ((width as f32).hypot(height as f32)).ceil() as i64 + 1;
    let band = config.band as i64;

    let point_at = |t: i64| (x0 + t as f32 * dx, y0 + t as f32 * dy);
    let hit = |t: i64| {
        let (px, py) = point_at(t);
        (-band..=band).any(|k| {
            let qx = (px + k as f32 * cos).round() as i64;
            let qy = (py + k as f32 * sin).round() as i64;
            is_edge(edges, qx, qy)
        })
    };

    let mut segments = Vec::new();
    let mut run: Option<(i64, i64)> = None;
    let emit = |start: i64, end: i64, segments: &mut Vec<LineSegment>| {
        if ((end - start) as f32) < config.min_length {
            return;
        }
        let (sx, sy) = point_at(start);
        let (ex, ey) = point_at(end);
        let clamp_x = |v: f32| v.round().clamp(0.0, (width - 1) as f32) as i32;
        let clamp_y = |v: f32| v.round().clamp(0.0, (height - 1) as f32) as i32;
        segments.push(LineSegment::new(clamp_x(sx), clamp_y(sy), clamp_x(ex), clamp_y(ey)).normalized());
    };

    for t in -reach..=reach {
        if hit(t) {
            run = match run {
                Some((start, _)) => Some((start, t)),
                None => Some((t, t)),
            };
        } else if let Some((start, last)) = run {
            if t - last > config.max_gap as i64 {
                emit(start, last, &mut segments);
                run = None;
            }
        }
    }
    if let Some((start, last)) = run {
        emit(start, last, &mut segments);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn draw_bar(img: &mut GrayImage, x0: u32, x1: u32, y0: u32, y1: u32, value: u8) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([value]));
            }
        }
    }

    #[test]
    fn test_single_horizontal_stroke_gives_one_segment() {
        let mut img = GrayImage::from_pixel(200, 100, Luma([255u8]));
        draw_bar(&mut img, 40, 160, 48, 51, 0);

        let lines = detect_lines(&img, &LineDetectionConfig::default()).unwrap();
        assert_eq!(lines.len(), 1, "one stroke should give one segment: {lines:?}");

        let line = lines[0];
        assert!(line.is_horizontal(HORIZONTAL_TOLERANCE_DEGREES));
        assert!(line.x1 <= line.x2);
        assert!(line.length() >= 100.0, "segment too short: {line:?}");
        assert!((line.y1 - 49).abs() <= 3);
    }

    #[test]
    fn test_short_stroke_is_below_min_length() {
        let mut img = GrayImage::from_pixel(200, 100, Luma([255u8]));
        draw_bar(&mut img, 80, 110, 48, 51, 0);
        assert!(detect_lines(&img, &LineDetectionConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_vertical_stroke_is_not_horizontal() {
        let mut img = GrayImage::from_pixel(100, 200, Luma([255u8]));
        draw_bar(&mut img, 48, 51, 40, 160, 0);

        let lines = detect_lines(&img, &LineDetectionConfig::default()).unwrap();
        assert!(!lines.is_empty());
        assert_eq!(count_horizontal(&lines, HORIZONTAL_TOLERANCE_DEGREES), 0);
        assert!(lines.iter().all(|l| (l.angle_degrees().abs() - 90.0).abs() < 1.0));
    }

    #[test]
    fn test_gaps_up_to_max_gap_are_bridged() {
        let mut edges = GrayImage::new(200, 40);
        draw_bar(&mut edges, 20, 80, 20, 21, 255);
        draw_bar(&mut edges, 86, 150, 20, 21, 255);

        let config = LineDetectionConfig::default();
        let lines = detect_lines_in_edges(&edges, &config);
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].length() >= 125.0);

        let strict = LineDetectionConfig { max_gap: 3, ..config };
        let split = detect_lines_in_edges(&edges, &strict);
        assert_eq!(split.len(), 2, "{split:?}");
    }

    #[test]
    fn test_blank_image_has_no_lines() {
        let img = GrayImage::from_pixel(120, 120, Luma([255u8]));
        assert!(detect_lines(&img, &LineDetectionConfig::default()).unwrap().is_empty());
    }
}
