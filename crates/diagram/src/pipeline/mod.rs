pub mod builder;

use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::{
    algorithms::preprocessing::ocr_preprocess,
    classifier::FeatureClassifier,
    config::AnalyzerConfig,
    error::{DiagramError, Result},
    selection::select_candidates,
    synthesis::synthesize,
    text::clean_text,
    traits::{Captioner, TextExtractor},
    types::{AnalysisResult, PageAnalysis, RegionCandidate, RegionOutcome, RegionReport},
};

/// Text extractor used when none is configured; always unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTextExtractor;

impl TextExtractor for DisabledTextExtractor {
    fn extract_text(&self, _image: &DynamicImage, _language_hint: &str) -> Result<String> {
        Err(DiagramError::CollaboratorUnavailable("no text extractor configured".to_string()))
    }
}

/// Page analysis: candidate selection, classification, text and description
pub struct Analyzer {
    config: AnalyzerConfig,
    classifier: FeatureClassifier,
    text_extractor: Box<dyn TextExtractor>,
    captioner: Option<Box<dyn Captioner>>,
}

impl Analyzer {
    /// Create a new analyzer builder
    pub fn builder() -> builder::AnalyzerBuilder {
        builder::AnalyzerBuilder::new()
    }

    pub fn new(
        config: AnalyzerConfig,
        text_extractor: Box<dyn TextExtractor>,
        captioner: Option<Box<dyn Captioner>>,
    ) -> Self {
        let classifier = FeatureClassifier::new(config.classifier.clone());
        Self {
            config,
            classifier,
            text_extractor,
            captioner,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze every candidate region on a page.
    ///
    /// Only an unusable page is an error. A region whose classification
    /// fails is kept as `Unclassifiable` and the remaining regions still run.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn analyze_page(&self, page: &DynamicImage) -> Result<PageAnalysis> {
        let candidates = select_candidates(page, &self.config.selection)?;
        info!(candidates = candidates.len(), "Analyzing candidate regions");

        let mut regions = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.into_iter().enumerate() {
            let outcome = match self.analyze_region(&candidate) {
                Ok(result) => RegionOutcome::Analyzed(result),
                Err(DiagramError::RegionAnalysis(reason)) => {
                    warn!(index, bbox = ?candidate.bounding_box, %reason, "Region could not be classified");
                    RegionOutcome::Unclassifiable { reason }
                }
                Err(err) => return Err(err),
            };
            regions.push(RegionReport {
                index,
                bounding_box: candidate.bounding_box,
                image: candidate.image,
                outcome,
            });
        }

        let analysis = PageAnalysis {
            width: page.width(),
            height: page.height(),
            regions,
        };
        info!(
            regions = analysis.regions.len(),
            matches = analysis.matches().count(),
            unclassifiable = analysis.unclassifiable_count(),
            "Page analyzed"
        );
        Ok(analysis)
    }

    /// Classify one region, then gather its text and caption
    pub fn analyze_region(&self, region: &RegionCandidate) -> Result<AnalysisResult> {
        let features = self.classifier.classify(region)?;
        let extracted_text = self.region_text(&region.image);
        let caption = self.region_caption(&region.image);
        let description = synthesize(&features, &extracted_text, caption.as_deref());

        debug!(
            bbox = ?region.bounding_box,
            line_count = features.line_count,
            text_chars = extracted_text.chars().count(),
            captioned = caption.is_some(),
            "Region analyzed"
        );
        Ok(AnalysisResult {
            features,
            extracted_text,
            description,
        })
    }

    /// Analyze a whole image as a single region
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn analyze_image(&self, image: &DynamicImage) -> Result<AnalysisResult> {
        let region = RegionCandidate::whole(image.clone())?;
        self.analyze_region(&region)
    }

    /// Coarse split of a page into sub-images, without classification
    pub fn split(&self, page: &DynamicImage) -> Result<Vec<RegionCandidate>> {
        select_candidates(page, &self.config.split)
    }

    /// Text for a region, or empty when disabled or the extractor fails
    fn region_text(&self, image: &DynamicImage) -> String {
        if !self.config.text_extraction_enabled {
            return String::new();
        }

        let prepared = if self.config.ocr_preprocess {
            match ocr_preprocess(image) {
                Ok(prepared) => prepared,
                Err(err) => {
                    warn!(error = %err, "OCR preprocessing failed, using the raw crop");
                    image.clone()
                }
            }
        } else {
            image.clone()
        };

        match self.text_extractor.extract_text(&prepared, &self.config.language_hint) {
            Ok(text) if self.config.clean_text => clean_text(&text),
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "Text extraction failed, continuing without text");
                String::new()
            }
        }
    }

    fn region_caption(&self, image: &DynamicImage) -> Option<String> {
        let captioner = self.captioner.as_ref()?;
        match captioner.caption(image) {
            Ok(caption) => Some(caption),
            Err(err) => {
                warn!(error = %err, "Captioning failed, continuing without caption");
                None
            }
        }
    }

    /// Get information about the analyzer configuration
    pub fn info(&self) -> String {
        format!(
            "Analyzer: candidates >= {}x{}, target lines {}..={}, text extraction {}, captioner {}",
            self.config.selection.min_width,
            self.config.selection.min_height,
            self.config.classifier.target_lines.start(),
            self.config.classifier.target_lines.end(),
            if self.config.text_extraction_enabled { "on" } else { "off" },
            if self.captioner.is_some() { "set" } else { "none" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_extractor_is_unavailable() {
        let image = DynamicImage::new_luma8(4, 4);
        assert!(matches!(
            DisabledTextExtractor.extract_text(&image, "eng"),
            Err(DiagramError::CollaboratorUnavailable(_))
        ));
    }

    #[test]
    fn test_enabled_extraction_without_extractor_gives_empty_text() {
        let analyzer = Analyzer::builder().enable_text_extraction("eng").build();
        let image = DynamicImage::new_luma8(60, 60);
        let result = analyzer.analyze_image(&image).unwrap();
        assert_eq!(result.extracted_text, "");
        assert!(!result.description.contains("Extracted text:"));
    }

    #[test]
    fn test_invalid_page_is_an_error() {
        let analyzer = Analyzer::builder().build();
        assert!(matches!(
            analyzer.analyze_page(&DynamicImage::new_rgb8(0, 0)),
            Err(DiagramError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_classifier_config_reaches_classifier() {
        let analyzer = Analyzer::builder()
            .with_classifier_config(crate::ClassifierConfig {
                target_lines: 0..=0,
                ..Default::default()
            })
            .build();
        let result = analyzer.analyze_image(&DynamicImage::new_luma8(60, 60)).unwrap();
        assert!(result.features.is_target_pattern, "a blank image has zero lines");
        assert!(result.description.contains("matches expected diagram structure"));
        assert!(analyzer.info().contains("0..=0"));
    }

    #[test]
    fn test_info_reports_configuration() {
        let info = Analyzer::builder().build().info();
        assert!(info.contains("100x100"));
        assert!(info.contains("6..=8"));
        assert!(info.contains("text extraction off"));
    }
}
