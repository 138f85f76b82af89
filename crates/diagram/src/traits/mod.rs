use image::{DynamicImage, GrayImage};
use crate::error::Result;

/// Trait for image preprocessing algorithms
pub trait ImagePreprocessor: Send + Sync {
    /// Preprocess the input image (e.g., threshold, edge map, denoise)
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for text extraction collaborators (OCR engines)
pub trait TextExtractor: Send + Sync {
    /// Return any text found in the image; an empty string is a valid answer
    fn extract_text(&self, image: &DynamicImage, language_hint: &str) -> Result<String>;
}

/// Trait for external captioning collaborators
pub trait Captioner: Send + Sync {
    /// Free-text description of the whole image
    fn caption(&self, image: &DynamicImage) -> Result<String>;
}

impl<F> TextExtractor for F
where
    F: Fn(&DynamicImage, &str) -> Result<String> + Send + Sync,
{
    fn extract_text(&self, image: &DynamicImage, language_hint: &str) -> Result<String> {
        self(image, language_hint)
    }
}

impl<F> Captioner for F
where
    F: Fn(&DynamicImage) -> Result<String> + Send + Sync,
{
    fn caption(&self, image: &DynamicImage) -> Result<String> {
        self(image)
    }
}
