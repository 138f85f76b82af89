//! Gradient-voting circle detection.
//!
//! Every Canny edge pixel votes along its gradient direction, in both senses,
//! for each radius in `[min_radius, max_radius]`. Circle centers produce
//! accumulator peaks because the gradients of a circular boundary converge
//! radially. Each accepted center then takes the radius with the most edge
//! pixels at that distance.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::{
    filter::gaussian_blur_f32,
    gradients::{horizontal_sobel, vertical_sobel},
    suppress::suppress_non_maximum,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{algorithms::lines::edge_map, error::Result, types::CircleCandidate};

/// Smoothing applied before taking gradient directions
const GRADIENT_SIGMA: f32 = 1.0;

/// Parameters for circle detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CircleDetectionConfig {
    /// Minimum distance between accepted centers
    pub min_dist: f32,
    /// High edge threshold; the low threshold is half of it
    pub param1: f32,
    /// Accumulator threshold for centers, and minimum edge support for a radius
    pub param2: u32,
    pub min_radius: u32,
    pub max_radius: u32,
}

impl Default for CircleDetectionConfig {
    fn default() -> Self {
        Self {
            min_dist: 50.0,
            param1: 50.0,
            param2: 30,
            min_radius: 30,
            max_radius: 100,
        }
    }
}

/// Detect circles in a grayscale image, strongest center first
pub fn detect_circles(gray: &GrayImage, config: &CircleDetectionConfig) -> Result<Vec<CircleCandidate>> {
    let edges = edge_map(gray, config.param1 / 2.0, config.param1)?;
    let edge_points: Vec<(u32, u32)> = edges
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 0)
        .map(|(x, y, _)| (x, y))
        .collect();

    if edge_points.is_empty() || config.min_radius > config.max_radius {
        return Ok(Vec::new());
    }

    let accumulator = vote_centers(gray, &edge_points, config);
    let mut centers: Vec<(u32, u32, u32)> = suppress_non_maximum(&accumulator, 1)
        .enumerate_pixels()
        .filter(|(_, _, votes)| votes[0] >= config.param2)
        .map(|(x, y, votes)| (x, y, votes[0]))
        .collect();
    // Stable sort keeps scan order among equal vote counts
    centers.sort_by(|a, b| b.2.cmp(&a.2));

    let mut circles: Vec<CircleCandidate> = Vec::new();
    let min_dist_sq = config.min_dist * config.min_dist;
    for (x, y, votes) in centers {
        let (cx, cy) = (x as f32, y as f32);
        let too_close = circles.iter().any(|c| {
            let (dx, dy) = (c.cx - cx, c.cy - cy);
            dx * dx + dy * dy < min_dist_sq
        });
        if too_close {
            continue;
        }
        if let Some(radius) = estimate_radius(cx, cy, &edge_points, config) {
            circles.push(CircleCandidate { cx, cy, radius, votes });
        }
    }

    debug!(edge_points = edge_points.len(), circles = circles.len(), "Circle voting complete");
    Ok(circles)
}

fn vote_centers(
    gray: &GrayImage,
    edge_points: &[(u32, u32)],
    config: &CircleDetectionConfig,
) -> ImageBuffer<Luma<u32>, Vec<u32>> {
    let (width, height) = gray.dimensions();
    let smoothed = gaussian_blur_f32(gray, GRADIENT_SIGMA);
    let gx = horizontal_sobel(&smoothed);
    let gy = vertical_sobel(&smoothed);

    let mut accumulator: ImageBuffer<Luma<u32>, Vec<u32>> = ImageBuffer::new(width, height);
    for &(x, y) in edge_points {
        let gxv = gx.get_pixel(x, y)[0] as f32;
        let gyv = gy.get_pixel(x, y)[0] as f32;
        let magnitude = gxv.hypot(gyv);
        if magnitude < f32::EPSILON {
            continue;
        }
        let (ux, uy) = (gxv / magnitude, gyv / magnitude);

        for sign in [-1.0f32, 1.0] {
            for r in config.min_radius..=config.max_radius {
                let vx = (x as f32 + sign * ux * r as f32).round();
                let vy = (y as f32 + sign * uy * r as f32).round();
                if vx < 0.0 || vy < 0.0 || vx >= width as f32 || vy >= height as f32 {
                    break;
                }
                let bin = accumulator.get_pixel_mut(vx as u32, vy as u32);
                bin[0] += 1;
            }
        }
    }
    accumulator
}

/// Radius with the most edge pixels at that distance, if it has enough support
fn estimate_radius(cx: f32, cy: f32, edge_points: &[(u32, u32)], config: &CircleDetectionConfig) -> Option<f32> {
    let span = (config.max_radius - config.min_radius + 1) as usize;
    let mut histogram = vec![0u32; span];
    for &(x, y) in edge_points {
        let distance = (x as f32 - cx).hypot(y as f32 - cy).round() as u32;
        if (config.min_radius..=config.max_radius).contains(&distance) {
            histogram[(distance - config.min_radius) as usize] += 1;
        }
    }

    // First bin wins ties so the smaller radius is preferred
    let (best, support) = histogram
        .iter()
        .enumerate()
        .fold((0usize, 0u32), |best, (i, &count)| if count > best.1 { (i, count) } else { best });

    (support >= config.param2).then(|| (best as u32 + config.min_radius) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_circle_mut;

    fn disk_image(cx: i32, cy: i32, radius: i32) -> GrayImage {
        let mut img = GrayImage::from_pixel(200, 200, Luma([255u8]));
        draw_filled_circle_mut(&mut img, (cx, cy), radius, Luma([0u8]));
        img
    }

    #[test]
    fn test_detects_single_disk() {
        let img = disk_image(100, 100, 50);
        let circles = detect_circles(&img, &CircleDetectionConfig::default()).unwrap();
        assert!(!circles.is_empty(), "expected a circle");

        let best = circles[0];
        assert!((best.cx - 100.0).abs() <= 3.0, "{best:?}");
        assert!((best.cy - 100.0).abs() <= 3.0, "{best:?}");
        assert!((best.radius - 50.0).abs() <= 4.0, "{best:?}");
        assert!(best.votes >= 30);
    }

    #[test]
    fn test_centers_respect_min_dist() {
        let img = disk_image(100, 100, 50);
        let circles = detect_circles(&img, &CircleDetectionConfig::default()).unwrap();
        for (i, a) in circles.iter().enumerate() {
            for b in &circles[i + 1..] {
                assert!((a.cx - b.cx).hypot(a.cy - b.cy) >= 50.0);
            }
        }
    }

    #[test]
    fn test_blank_image_has_no_circles() {
        let img = GrayImage::from_pixel(150, 150, Luma([255u8]));
        assert!(detect_circles(&img, &CircleDetectionConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_radius_below_min_radius_is_not_reported() {
        let img = disk_image(100, 100, 15);
        assert!(detect_circles(&img, &CircleDetectionConfig::default()).unwrap().is_empty());
    }
}
