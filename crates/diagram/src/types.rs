use image::DynamicImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DiagramError, Result};

/// Axis-aligned box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Create a new box, rejecting zero extents
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DiagramError::InvalidImage(format!(
                "bounding box must have positive extent, got {}x{}",
                width, height
            )));
        }
        Ok(Self { x, y, width, height })
    }

    /// Build a box from inclusive pixel extremes
    pub fn from_extremes(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    /// Box covering a whole `width` x `height` image
    pub fn full(width: u32, height: u32) -> Result<Self> {
        Self::new(0, 0, width, height)
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Check that the box lies inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// A straight segment between two pixel endpoints.
///
/// The angle is derived from the endpoints every time it is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LineSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Same segment with endpoints ordered left to right (top to bottom when vertical)
    pub fn normalized(self) -> Self {
        if self.x1 > self.x2 || (self.x1 == self.x2 && self.y1 > self.y2) {
            Self::new(self.x2, self.y2, self.x1, self.y1)
        } else {
            self
        }
    }

    /// `atan2(y2 - y1, x2 - x1)` in degrees, within [-180, 180]
    pub fn angle_degrees(&self) -> f32 {
        let dy = (self.y2 - self.y1) as f32;
        let dx = (self.x2 - self.x1) as f32;
        dy.atan2(dx).to_degrees()
    }

    pub fn length(&self) -> f32 {
        let dx = (self.x2 - self.x1) as f32;
        let dy = (self.y2 - self.y1) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether the segment lies within `tolerance` degrees of the x-axis
    pub fn is_horizontal(&self, tolerance: f32) -> bool {
        self.angle_degrees().abs() < tolerance
    }
}

/// A detected circle. Only presence is consumed by classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CircleCandidate {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    /// Accumulator votes at the center
    pub votes: u32,
}

/// Geometric findings for one candidate region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureReport {
    pub has_circle: bool,
    pub circles: Vec<CircleCandidate>,
    /// Rectangular contours, in contour scan order
    pub rectangles: Vec<BoundingBox>,
    /// All detected line segments
    pub line_count: usize,
    /// Segments within the horizontal tolerance
    pub horizontal_line_count: usize,
    pub is_target_pattern: bool,
}

impl FeatureReport {
    pub fn has_rectangle(&self) -> bool {
        !self.rectangles.is_empty()
    }
}

/// A cropped sub-image and its location in the parent page
#[derive(Debug, Clone)]
pub struct RegionCandidate {
    pub bounding_box: BoundingBox,
    pub image: DynamicImage,
}

impl RegionCandidate {
    /// Treat a whole image as a single region
    pub fn whole(image: DynamicImage) -> Result<Self> {
        let bounding_box = BoundingBox::full(image.width(), image.height())?;
        Ok(Self { bounding_box, image })
    }
}

/// Terminal artifact for one analysed region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    pub features: FeatureReport,
    pub extracted_text: String,
    pub description: String,
}

/// What happened to a single candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegionOutcome {
    Analyzed(AnalysisResult),
    /// Classification failed; this is not the same as "no pattern"
    Unclassifiable { reason: String },
}

/// Per-candidate entry of a page analysis
#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub index: usize,
    pub bounding_box: BoundingBox,
    /// The crop, exposed so callers can persist it
    #[serde(skip)]
    pub image: DynamicImage,
    pub outcome: RegionOutcome,
}

impl RegionReport {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.outcome {
            RegionOutcome::Analyzed(result) => Some(result),
            RegionOutcome::Unclassifiable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageAnalysis {
    pub width: u32,
    pub height: u32,
    pub regions: Vec<RegionReport>,
}

impl PageAnalysis {
    /// Regions whose features matched the target pattern
    pub fn matches(&self) -> impl Iterator<Item = &RegionReport> {
        self.regions
            .iter()
            .filter(|region| region.result().is_some_and(|r| r.features.is_target_pattern))
    }

    pub fn unclassifiable_count(&self) -> usize {
        self.regions.iter().filter(|region| region.result().is_none()).count()
    }
}
