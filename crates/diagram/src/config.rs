use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{classifier::ClassifierConfig, selection::SelectionConfig};

/// Everything the analyzer needs besides its collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Candidate rules for page scans
    pub selection: SelectionConfig,
    /// Candidate rules for the coarse sub-image split
    pub split: SelectionConfig,
    pub classifier: ClassifierConfig,
    /// Ask the text extractor for each analysed region
    pub text_extraction_enabled: bool,
    /// Passed through to the text extractor (e.g. a tesseract language code)
    pub language_hint: String,
    /// Binarize and denoise a region before handing it to the text extractor
    pub ocr_preprocess: bool,
    /// Normalize whitespace and drop page numbers in extracted text
    pub clean_text: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConfig::default(),
            split: SelectionConfig::split(),
            classifier: ClassifierConfig::default(),
            text_extraction_enabled: false,
            language_hint: "eng".to_string(),
            ocr_preprocess: true,
            clean_text: true,
        }
    }
}
