//! Deterministic description assembly.
//!
//! The summary sentence is built from up to three clauses in a fixed order
//! (framing, line count, pattern verdict). Extracted text and an external
//! caption follow as separate labelled blocks, verbatim. Nothing here
//! reconciles the caption with the geometric findings.

use crate::types::FeatureReport;

pub const EXTRACTED_TEXT_LABEL: &str = "Extracted text:";
pub const EXTERNAL_CAPTION_LABEL: &str = "External caption:";

const BLOCK_SEPARATOR: &str = "\n\n";

fn shape_clause(report: &FeatureReport) -> Option<&'static str> {
    match (report.has_circle, report.has_rectangle()) {
        (true, true) => Some("contains both circular and rectangular framing"),
        (true, false) => Some("contains circular framing"),
        (false, true) => Some("contains rectangular framing"),
        (false, false) => None,
    }
}

fn pattern_clause(report: &FeatureReport) -> &'static str {
    if report.is_target_pattern {
        "matches expected diagram structure"
    } else {
        "does not fully match expected diagram structure"
    }
}

/// Compose the description for one region
pub fn synthesize(report: &FeatureReport, extracted_text: &str, external_caption: Option<&str>) -> String {
    let mut clauses: Vec<String> = Vec::with_capacity(3);
    if let Some(shape) = shape_clause(report) {
        clauses.push(shape.to_string());
    }
    if report.line_count > 0 {
        clauses.push(format!("detected {} line segments", report.line_count));
    }
    clauses.push(pattern_clause(report).to_string());

    let mut description = format!("The region {}.", clauses.join("; "));

    if !extracted_text.is_empty() {
        description.push_str(BLOCK_SEPARATOR);
        description.push_str(EXTRACTED_TEXT_LABEL);
        description.push('\n');
        description.push_str(extracted_text);
    }

    if let Some(caption) = external_caption {
        description.push_str(BLOCK_SEPARATOR);
        description.push_str(EXTERNAL_CAPTION_LABEL);
        description.push('\n');
        description.push_str(caption);
    }

    description
}
