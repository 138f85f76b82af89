use image::{DynamicImage, GrayImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DiagramError, Result},
    traits::ImagePreprocessor,
};

/// Default fixed binarization threshold
pub const DEFAULT_THRESHOLD: u8 = 127;

/// How a grayscale image is split into foreground and background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BinarizeMode {
    /// Intensity strictly above `threshold` is foreground
    Fixed { threshold: u8 },
    /// Threshold chosen from the histogram by Otsu's method
    Otsu,
}

impl Default for BinarizeMode {
    fn default() -> Self {
        Self::Fixed { threshold: DEFAULT_THRESHOLD }
    }
}

fn ensure_area(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DiagramError::InvalidImage(format!(
            "image has zero area ({}x{})",
            width, height
        )));
    }
    Ok(())
}

/// Luma conversion shared by every stage
pub fn to_grayscale(image: &DynamicImage) -> Result<GrayImage> {
    ensure_area(image.width(), image.height())?;
    Ok(image.to_luma8())
}

/// Binarize a grayscale image into {0, 255}
pub fn binarize_gray(gray: &GrayImage, mode: BinarizeMode) -> Result<GrayImage> {
    ensure_area(gray.width(), gray.height())?;
    let threshold = match mode {
        BinarizeMode::Fixed { threshold } => threshold,
        BinarizeMode::Otsu => imageproc::contrast::otsu_level(gray),
    };
    Ok(imageproc::contrast::threshold(gray, threshold))
}

/// Grayscale conversion followed by binarization
pub fn binarize(image: &DynamicImage, mode: BinarizeMode) -> Result<GrayImage> {
    let gray = to_grayscale(image)?;
    binarize_gray(&gray, mode)
}

/// Cleanup applied ahead of text extraction: Otsu binarization, then a
/// median filter to knock out speckle.
pub fn ocr_preprocess(image: &DynamicImage) -> Result<DynamicImage> {
    let gray = to_grayscale(image)?;
    let binary = OtsuPreprocessor.preprocess(&gray)?;
    let denoised = MedianDenoisePreprocessor::default().preprocess(&binary)?;
    Ok(DynamicImage::ImageLuma8(denoised))
}

/// Fixed thresholding preprocessor
#[derive(Debug, Clone)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
}

impl Default for ThresholdPreprocessor {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

impl ImagePreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        binarize_gray(image, BinarizeMode::Fixed { threshold: self.threshold })
    }
}

/// Otsu thresholding preprocessor
#[derive(Debug, Clone, Default)]
pub struct OtsuPreprocessor;

impl ImagePreprocessor for OtsuPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        binarize_gray(image, BinarizeMode::Otsu)
    }
}

/// Canny edge map with hysteresis thresholds
#[derive(Debug, Clone)]
pub struct CannyPreprocessor {
    pub low: f32,
    pub high: f32,
}

impl Default for CannyPreprocessor {
    fn default() -> Self {
        Self { low: 50.0, high: 150.0 }
    }
}

impl ImagePreprocessor for CannyPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        ensure_area(image.width(), image.height())?;
        Ok(imageproc::edges::canny(image, self.low, self.high))
    }
}

/// Median filter for salt-and-pepper noise
#[derive(Debug, Clone)]
pub struct MedianDenoisePreprocessor {
    pub radius: u32,
}

impl Default for MedianDenoisePreprocessor {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

impl ImagePreprocessor for MedianDenoisePreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::filter::median_filter(image, self.radius, self.radius))
    }
}

/// Swap foreground and background
#[derive(Debug, Clone, Default)]
pub struct InvertPreprocessor;

impl ImagePreprocessor for InvertPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let mut inverted = image.clone();
        image::imageops::invert(&mut inverted);
        Ok(inverted)
    }
}
