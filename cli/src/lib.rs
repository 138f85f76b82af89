pub mod collaborators;
pub mod report;

use diagram::AnalyzerConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use collaborators::{CommandCaptioner, TesseractExtractor};
pub use report::{region_file_name, TrainingRecord};

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    DiagramError(#[from] diagram::DiagramError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// How to run the tesseract binary
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct TesseractSettings {
    /// Executable name or path
    pub binary: String,
    /// Extra arguments placed after the language flag
    pub args: Vec<String>,
}

impl Default for TesseractSettings {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            args: vec!["--oem".into(), "3".into(), "--psm".into(), "3".into()],
        }
    }
}

/// External program that prints a caption for the image path it is given
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CaptionCommand {
    pub program: String,
    /// Arguments placed before the image path
    #[serde(default)]
    pub args: Vec<String>,
}

/// Scan configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ScanSettings {
    pub output_dir: String,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    /// Enables text extraction when present
    #[serde(default)]
    pub tesseract: Option<TesseractSettings>,
    #[serde(default)]
    pub caption_command: Option<CaptionCommand>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            analyzer: AnalyzerConfig::default(),
            tesseract: None,
            caption_command: None,
        }
    }
}

impl ScanSettings {
    /// Load ScanSettings configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load ScanSettings configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load ScanSettings configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load ScanSettings configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Load from a file when one is given, defaults otherwise
    pub fn from_optional_file(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Save to `.toml` or `.json` depending on the extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(CliError::UnsupportedFileFormat),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }

    /// Convert ScanSettings to TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert ScanSettings to JSON string
    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Analyzer config with text extraction following the tesseract section
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        let mut config = self.analyzer.clone();
        if self.tesseract.is_some() {
            config.text_extraction_enabled = true;
        }
        config
    }
}

/// JSON schema of the scan configuration, pretty-printed
pub fn settings_schema() -> Result<String, CliError> {
    let schema = schemars::schema_for!(ScanSettings);
    Ok(serde_json::to_string_pretty(&schema)?)
}
