use crate::{
    classifier::ClassifierConfig,
    config::AnalyzerConfig,
    pipeline::{Analyzer, DisabledTextExtractor},
    selection::SelectionConfig,
    traits::{Captioner, TextExtractor},
};

/// Builder for creating analyzers with a fluent API
pub struct AnalyzerBuilder {
    config: AnalyzerConfig,
    text_extractor: Option<Box<dyn TextExtractor>>,
    captioner: Option<Box<dyn Captioner>>,
}

impl AnalyzerBuilder {
    /// Create a new analyzer builder
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
            text_extractor: None,
            captioner: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Candidate rules for page scans
    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.config.selection = selection;
        self
    }

    pub fn with_classifier_config(mut self, classifier: ClassifierConfig) -> Self {
        self.config.classifier = classifier;
        self
    }

    /// Set the text extractor (replaces any existing one)
    pub fn with_text_extractor<E>(mut self, extractor: E) -> Self
    where
        E: TextExtractor + 'static,
    {
        self.text_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the captioner (replaces any existing one)
    pub fn with_captioner<C>(mut self, captioner: C) -> Self
    where
        C: Captioner + 'static,
    {
        self.captioner = Some(Box::new(captioner));
        self
    }

    /// Turn on text extraction with the given language hint
    pub fn enable_text_extraction(mut self, language_hint: impl Into<String>) -> Self {
        self.config.text_extraction_enabled = true;
        self.config.language_hint = language_hint.into();
        self
    }

    /// Build the analyzer with default components if not specified
    pub fn build(self) -> Analyzer {
        let text_extractor = self
            .text_extractor
            .unwrap_or_else(|| Box::new(DisabledTextExtractor));

        Analyzer::new(self.config, text_extractor, self.captioner)
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
