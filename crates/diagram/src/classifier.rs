use std::ops::RangeInclusive;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    algorithms::{
        circles::{detect_circles, CircleDetectionConfig},
        contours::{filter_larger_than, find_external_contours},
        lines::{count_horizontal, detect_lines, LineDetectionConfig, HORIZONTAL_TOLERANCE_DEGREES},
        preprocessing::{binarize_gray, to_grayscale, BinarizeMode, InvertPreprocessor},
    },
    error::{DiagramError, Result},
    traits::ImagePreprocessor,
    types::{FeatureReport, RegionCandidate},
};

/// Thresholds for region classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Binarization used for rectangle contours
    pub binarize: BinarizeMode,
    /// Treat dark pixels as foreground when looking for rectangles
    pub invert_rectangles: bool,
    /// Rectangles must be strictly wider and taller than this
    pub min_rectangle_size: u32,
    /// Degrees from the x-axis within which a segment is horizontal
    pub horizontal_tolerance: f32,
    /// Inclusive range of horizontal segment counts that identify the target diagram
    pub target_lines: RangeInclusive<usize>,
    pub lines: LineDetectionConfig,
    pub circles: CircleDetectionConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            binarize: BinarizeMode::default(),
            invert_rectangles: false,
            min_rectangle_size: 30,
            horizontal_tolerance: HORIZONTAL_TOLERANCE_DEGREES,
            target_lines: 6..=8,
            lines: LineDetectionConfig::default(),
            circles: CircleDetectionConfig::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn is_target_count(&self, horizontal_count: usize) -> bool {
        self.target_lines.contains(&horizontal_count)
    }
}

/// Geometric classifier for candidate regions
#[derive(Debug, Clone, Default)]
pub struct FeatureClassifier {
    pub config: ClassifierConfig,
}

impl FeatureClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Run every detector on the region and apply the line-count rule.
    ///
    /// Any failure is reported as `RegionAnalysis`; callers must not read it
    /// as "no pattern".
    pub fn classify(&self, region: &RegionCandidate) -> Result<FeatureReport> {
        self.run(region).map_err(|err| {
            DiagramError::RegionAnalysis(format!("region at {:?}: {}", region.bounding_box, err))
        })
    }

    fn run(&self, region: &RegionCandidate) -> Result<FeatureReport> {
        let config = &self.config;
        let gray = to_grayscale(&region.image)?;

        let circles = detect_circles(&gray, &config.circles)?;

        let mut binary = binarize_gray(&gray, config.binarize)?;
        if config.invert_rectangles {
            binary = InvertPreprocessor.preprocess(&binary)?;
        }
        let rectangles = filter_larger_than(
            find_external_contours(&binary),
            config.min_rectangle_size,
            config.min_rectangle_size,
        );

        let lines = detect_lines(&gray, &config.lines)?;
        let horizontal_line_count = count_horizontal(&lines, config.horizontal_tolerance);

        let report = FeatureReport {
            has_circle: !circles.is_empty(),
            circles,
            rectangles,
            line_count: lines.len(),
            horizontal_line_count,
            is_target_pattern: config.is_target_count(horizontal_line_count),
        };

        debug!(
            bbox = ?region.bounding_box,
            has_circle = report.has_circle,
            rectangles = report.rectangles.len(),
            line_count = report.line_count,
            horizontal = horizontal_line_count,
            is_target = report.is_target_pattern,
            "Region classified"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};
    use imageproc::{
        drawing::draw_hollow_circle_mut,
        geometric_transformations::{rotate_about_center, Interpolation},
    };

    /// Six stacked 3px strokes on white, the way the target figure draws them
    fn six_strokes() -> GrayImage {
        let mut img = GrayImage::from_pixel(240, 240, Luma([255u8]));
        for i in 0..6 {
            let top = 45 + i * 28;
            for y in top..top + 3 {
                for x in 60..180 {
                    img.put_pixel(x, y, Luma([0u8]));
                }
            }
        }
        img
    }

    fn region(img: GrayImage) -> RegionCandidate {
        RegionCandidate::whole(DynamicImage::ImageLuma8(img)).unwrap()
    }

    #[test]
    fn test_six_horizontal_strokes_match_target() {
        let report = FeatureClassifier::default().classify(&region(six_strokes())).unwrap();
        assert_eq!(report.line_count, 6);
        assert_eq!(report.horizontal_line_count, 6);
        assert!(report.is_target_pattern);
    }

    #[test]
    fn test_rotated_strokes_fail_horizontal_tolerance() {
        let rotated = rotate_about_center(
            &six_strokes(),
            std::f32::consts::FRAC_PI_4,
            Interpolation::Nearest,
            Luma([255u8]),
        );
        let report = FeatureClassifier::default().classify(&region(rotated)).unwrap();
        assert_eq!(report.horizontal_line_count, 0);
        assert!(!report.is_target_pattern);
    }

    #[test]
    fn test_target_range_bounds() {
        // Six strokes is the figure itself; doubled strokes from detector
        // noise can push the count to seven or eight. The bound is empirical.
        let config = ClassifierConfig::default();
        assert!(!config.is_target_count(5));
        assert!(config.is_target_count(6));
        assert!(config.is_target_count(7));
        assert!(config.is_target_count(8));
        assert!(!config.is_target_count(9));
    }

    #[test]
    fn test_target_range_is_configurable() {
        let classifier = FeatureClassifier::new(ClassifierConfig {
            target_lines: 3..=4,
            ..ClassifierConfig::default()
        });
        let report = classifier.classify(&region(six_strokes())).unwrap();
        assert!(!report.is_target_pattern);
    }

    #[test]
    fn test_blank_region_has_no_lines_and_no_match() {
        let report = FeatureClassifier::default()
            .classify(&region(GrayImage::from_pixel(120, 120, Luma([255u8]))))
            .unwrap();
        assert_eq!(report.line_count, 0);
        assert!(!report.is_target_pattern);
        assert!(!report.has_circle);
    }

    #[test]
    fn test_circle_and_rectangles_are_reported() {
        let mut img = GrayImage::from_pixel(220, 220, Luma([0u8]));
        draw_hollow_circle_mut(&mut img, (110, 110), 60, Luma([255u8]));
        for y in 20..60 {
            for x in 20..60 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }

        let report = FeatureClassifier::default().classify(&region(img)).unwrap();
        assert!(report.has_circle, "{report:?}");
        assert!(report.has_rectangle());
        assert!(report.rectangles.iter().all(|r| r.width > 30 && r.height > 30));
    }

    #[test]
    fn test_rectangle_flush_with_left_edge_is_reported() {
        let mut img = GrayImage::new(120, 120);
        for y in 30..90 {
            for x in 0..60 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        let report = FeatureClassifier::default().classify(&region(img)).unwrap();
        assert_eq!(
            report.rectangles,
            vec![crate::types::BoundingBox { x: 0, y: 30, width: 60, height: 60 }]
        );
    }

    #[test]
    fn test_small_blobs_are_not_rectangles() {
        let mut img = GrayImage::new(100, 100);
        for y in 10..40 {
            for x in 10..40 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        let report = FeatureClassifier::default().classify(&region(img)).unwrap();
        assert!(!report.has_rectangle(), "30px blob is not strictly larger than 30: {report:?}");
    }

    #[test]
    fn test_empty_region_is_region_analysis_error() {
        let empty = RegionCandidate {
            bounding_box: crate::types::BoundingBox::full(1, 1).unwrap(),
            image: DynamicImage::new_luma8(0, 0),
        };
        assert!(matches!(
            FeatureClassifier::default().classify(&empty),
            Err(DiagramError::RegionAnalysis(_))
        ));
    }
}
