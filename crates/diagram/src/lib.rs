//! # Diagram Region Analysis Library
//!
//! Finds diagram-like regions on scanned pages and decides, from geometry
//! alone, whether a region has the expected structure: stacked horizontal
//! strokes, usually framed by a circle or a rectangle. Each region gets a
//! fixed-form description, optionally enriched with text from an OCR engine
//! and a caption from an external model.
//!
//! ## Core Features
//!
//! - **Candidate Selection**: Contour boxes filtered by size and squareness
//! - **Geometric Classification**: Line, circle and rectangle detectors on each crop
//! - **Pluggable Collaborators**: OCR and captioning behind traits, closures included
//! - **Serializable Reports**: Every config and result derives serde and JSON schema
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use diagram::Analyzer;
//!
//! let analyzer = Analyzer::builder().build();
//!
//! let page = image::open("page.png")?;
//! let analysis = analyzer.analyze_page(&page)?;
//!
//! for region in analysis.matches() {
//!     println!("{:?}", region.bounding_box);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Collaborators
//!
//! ```rust,no_run
//! use diagram::{Analyzer, CandidateOrder, SelectionConfig};
//! use image::DynamicImage;
//!
//! let analyzer = Analyzer::builder()
//!     .with_selection(SelectionConfig {
//!         order: CandidateOrder::ReadingOrder,
//!         ..SelectionConfig::default()
//!     })
//!     .with_text_extractor(|_: &DynamicImage, _: &str| -> diagram::Result<String> {
//!         Ok("乾".to_string())
//!     })
//!     .enable_text_extraction("chi_tra")
//!     .build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod selection;
pub mod classifier;
pub mod synthesis;
pub mod text;
pub mod config;
pub mod pipeline;

// Re-exports for convenience
pub use error::{DiagramError, Result};
pub use types::*;
pub use traits::*;
pub use selection::{candidate_boxes, select_candidates, CandidateOrder, CandidateSource, SelectionConfig};
pub use classifier::{ClassifierConfig, FeatureClassifier};
pub use synthesis::synthesize;
pub use text::clean_text;
pub use config::AnalyzerConfig;
pub use pipeline::{builder::AnalyzerBuilder, Analyzer, DisabledTextExtractor};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    /// White page with one dark square frame holding six strokes
    fn create_test_page() -> DynamicImage {
        let mut img = RgbImage::from_pixel(400, 400, Rgb([255, 255, 255]));
        let (x0, y0, size) = (80u32, 60u32, 240u32);
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                let on_frame = x < x0 + 3 || x >= x0 + size - 3 || y < y0 + 3 || y >= y0 + size - 3;
                if on_frame {
                    img.put_pixel(x, y, Rgb([0, 0, 0]));
                }
            }
        }
        for i in 0..6 {
            let top = y0 + 45 + i * 28;
            for y in top..top + 3 {
                for x in x0 + 60..x0 + 180 {
                    img.put_pixel(x, y, Rgb([0, 0, 0]));
                }
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_analyzer_basic() {
        let analyzer = Analyzer::builder().build();
        let page = create_test_page();

        let analysis = analyzer.analyze_page(&page).expect("Should analyze successfully");
        assert_eq!(analysis.width, 400);
        assert_eq!(analysis.height, 400);
        assert!(!analysis.regions.is_empty(), "Should find the framed region");
        assert_eq!(analysis.unclassifiable_count(), 0);
    }

    #[test]
    fn test_framed_strokes_produce_a_description() {
        let analyzer = Analyzer::builder().build();
        let page = create_test_page();

        let analysis = analyzer.analyze_page(&page).expect("Should analyze successfully");
        let outer = analysis
            .regions
            .iter()
            .max_by_key(|region| region.bounding_box.area())
            .expect("Should find at least one region");
        let result = outer.result().expect("Region should be classified");
        assert!(result.description.starts_with("The region "));
        assert!(result.features.line_count > 0);
    }

    #[test]
    fn test_split_uses_coarse_rules() {
        let analyzer = Analyzer::builder().build();
        let page = create_test_page();
        let pieces = analyzer.split(&page).expect("Should split successfully");
        assert!(pieces.iter().all(|piece| piece.bounding_box.width > 0));
        assert!(pieces.iter().all(|piece| piece.bounding_box.fits_within(400, 400)));
    }
}
