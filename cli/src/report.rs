use std::fs;
use std::path::{Path, PathBuf};

use diagram::{BoundingBox, PageAnalysis, RegionCandidate, RegionOutcome};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::CliError;

/// One entry of `training_data.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingRecord {
    /// Always `"image"` for region descriptions
    pub kind: String,
    pub content: String,
    pub page: usize,
    pub image_path: String,
}

/// Per-page entry of `analysis.json`
#[derive(Debug, Serialize)]
pub struct PageReport<'a> {
    pub page: usize,
    pub source: String,
    pub analysis: &'a PageAnalysis,
    pub image_paths: Vec<String>,
}

/// File name for a saved crop; pages and regions are numbered from 1
pub fn region_file_name(page: usize, index: usize) -> String {
    format!("page{}_region{}.png", page, index + 1)
}

/// Save every region crop of a page and return the written paths in region order
pub fn save_regions(analysis: &PageAnalysis, page: usize, output_dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    analysis
        .regions
        .iter()
        .map(|region| {
            let path = output_dir.join(region_file_name(page, region.index));
            region.image.save(&path)?;
            Ok(path)
        })
        .collect()
}

/// Save split pieces as `page{P}_region{I}.png`, returning each path with its box
pub fn save_candidates(
    candidates: &[RegionCandidate],
    page: usize,
    output_dir: &Path,
) -> Result<Vec<(PathBuf, BoundingBox)>, CliError> {
    candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let path = output_dir.join(region_file_name(page, index));
            candidate.image.save(&path)?;
            Ok((path, candidate.bounding_box))
        })
        .collect()
}

/// Training records for the analysed regions of one page.
///
/// Regions that could not be classified have no description and are skipped.
pub fn training_records(analysis: &PageAnalysis, page: usize, image_paths: &[PathBuf]) -> Vec<TrainingRecord> {
    analysis
        .regions
        .iter()
        .zip(image_paths)
        .filter_map(|(region, path)| match &region.outcome {
            RegionOutcome::Analyzed(result) => Some(TrainingRecord {
                kind: "image".to_string(),
                content: result.description.clone(),
                page,
                image_path: path.to_string_lossy().into_owned(),
            }),
            RegionOutcome::Unclassifiable { .. } => None,
        })
        .collect()
}

/// Pretty JSON with non-ASCII text kept as-is
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), CliError> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    info!("Saved {}", path.display());
    Ok(())
}
