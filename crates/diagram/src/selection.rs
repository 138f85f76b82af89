use image::{DynamicImage, GrayImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};
use tracing::debug;

use crate::{
    algorithms::{
        contours::find_external_contours,
        preprocessing::{to_grayscale, CannyPreprocessor, InvertPreprocessor, ThresholdPreprocessor, DEFAULT_THRESHOLD},
    },
    error::Result,
    traits::ImagePreprocessor,
    types::{BoundingBox, RegionCandidate},
};

/// Where the binary image used for contour search comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateSource {
    /// Fixed threshold; `invert` makes dark ink the foreground
    Threshold { threshold: u8, invert: bool },
    /// Canny edge map
    Canny { low: f32, high: f32 },
}

impl CandidateSource {
    fn binary(&self, gray: &GrayImage) -> Result<GrayImage> {
        match *self {
            Self::Threshold { threshold, invert } => {
                let binary = ThresholdPreprocessor { threshold }.preprocess(gray)?;
                if invert {
                    InvertPreprocessor.preprocess(&binary)
                } else {
                    Ok(binary)
                }
            }
            Self::Canny { low, high } => CannyPreprocessor { low, high }.preprocess(gray),
        }
    }
}

/// Order in which candidates are emitted
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CandidateOrder {
    /// Contour scan order, no positional meaning
    #[default]
    ScanOrder,
    /// Sorted top-to-bottom, then left-to-right
    ReadingOrder,
}

/// Size, shape and ordering rules for candidate regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SelectionConfig {
    pub min_width: u32,
    pub min_height: u32,
    /// Reject boxes that are not near-square
    pub require_square: bool,
    /// Allowed `|width / height - 1|` when `require_square` is set
    pub aspect_tolerance: f32,
    pub source: CandidateSource,
    pub order: CandidateOrder,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_width: 100,
            min_height: 100,
            require_square: true,
            aspect_tolerance: 0.2,
            source: CandidateSource::Canny { low: 50.0, high: 150.0 },
            order: CandidateOrder::ScanOrder,
        }
    }
}

impl SelectionConfig {
    /// Coarse variant for generic sub-image splitting
    pub fn split() -> Self {
        Self {
            min_width: 50,
            min_height: 50,
            require_square: false,
            aspect_tolerance: 0.2,
            source: CandidateSource::Threshold { threshold: DEFAULT_THRESHOLD, invert: false },
            order: CandidateOrder::ScanOrder,
        }
    }

    /// Whether a contour box qualifies as a candidate
    pub fn accepts(&self, bbox: &BoundingBox) -> bool {
        let big_enough = bbox.width >= self.min_width && bbox.height >= self.min_height;
        let shaped = !self.require_square || (bbox.aspect_ratio() - 1.0).abs() < self.aspect_tolerance;
        big_enough && shaped
    }
}

/// Boxes on the page that qualify as candidate regions
pub fn candidate_boxes(page: &DynamicImage, config: &SelectionConfig) -> Result<Vec<BoundingBox>> {
    let gray = to_grayscale(page)?;
    let binary = config.source.binary(&gray)?;
    let contours = find_external_contours(&binary);
    let total = contours.len();

    let mut boxes: Vec<BoundingBox> = contours.into_iter().filter(|b| config.accepts(b)).collect();
    if config.order == CandidateOrder::ReadingOrder {
        boxes.sort_by_key(|b| (b.y, b.x));
    }

    debug!(contours = total, candidates = boxes.len(), order = %config.order, "Candidate boxes selected");
    Ok(boxes)
}

/// Crop every qualifying box out of the page
pub fn select_candidates(page: &DynamicImage, config: &SelectionConfig) -> Result<Vec<RegionCandidate>> {
    let boxes = candidate_boxes(page, config)?;
    Ok(boxes
        .into_iter()
        .map(|bounding_box| RegionCandidate {
            image: page.crop_imm(bounding_box.x, bounding_box.y, bounding_box.width, bounding_box.height),
            bounding_box,
        })
        .collect())
}
