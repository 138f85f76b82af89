use clap::{Parser, Subcommand};
use cli::{
    report::{save_candidates, save_regions, training_records, write_json, PageReport},
    settings_schema, CommandCaptioner, ScanSettings, TesseractExtractor,
};
use color_eyre::eyre::Result;
use diagram::Analyzer;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find and describe diagram regions on page images
    Scan {
        /// Path to the TOML or JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Page images, numbered from 1 in the order given
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Split an image into sub-images and save each one
    Split {
        /// Path to the input image
        image: PathBuf,
        /// Output directory for the pieces
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Optional configuration file; its `analyzer.split` rules are used
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Classify a whole image as one region and print its description
    Classify {
        /// Path to the input image
        image: PathBuf,
        /// Optional configuration file for thresholds and collaborators
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the JSON schema of the configuration file
    Schema,
    /// Write a default configuration file (.toml or .json)
    InitConfig {
        /// Where to write the configuration
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Scan { config, images } => scan(config, images)?,
        Commands::Split { image, output_dir, config } => split(image, output_dir, config.as_deref())?,
        Commands::Classify { image, config } => classify(image, config.as_deref())?,
        Commands::Schema => println!("{}", settings_schema()?),
        Commands::InitConfig { path } => {
            ScanSettings::default().to_file(path)?;
            info!("Configuration written to {:?}", path);
        }
    }

    Ok(())
}

fn build_analyzer(settings: &ScanSettings) -> Analyzer {
    let mut builder = Analyzer::builder().with_config(settings.analyzer_config());
    if let Some(tesseract) = &settings.tesseract {
        builder = builder.with_text_extractor(TesseractExtractor::new(tesseract.clone()));
    }
    if let Some(command) = &settings.caption_command {
        builder = builder.with_captioner(CommandCaptioner::new(command.clone()));
    }
    builder.build()
}

fn scan(config_path: &Path, images: &[PathBuf]) -> Result<()> {
    let settings = ScanSettings::from_file(config_path)?;
    let analyzer = build_analyzer(&settings);
    info!("{}", analyzer.info());

    let output_dir = PathBuf::from(&settings.output_dir);
    std::fs::create_dir_all(&output_dir)?;

    let mut analyses = Vec::with_capacity(images.len());
    let mut records = Vec::new();
    let mut saved = Vec::with_capacity(images.len());
    for (i, image_path) in images.iter().enumerate() {
        let page = i + 1;
        info!("Processing page {} -> {:?}", page, image_path);

        let image = image::open(image_path)?;
        let analysis = analyzer.analyze_page(&image)?;
        let paths = save_regions(&analysis, page, &output_dir)?;
        records.extend(training_records(&analysis, page, &paths));

        if analysis.unclassifiable_count() > 0 {
            warn!(
                "Page {}: {} region(s) could not be classified",
                page,
                analysis.unclassifiable_count()
            );
        }
        analyses.push(analysis);
        saved.push(paths);
    }

    let reports: Vec<PageReport> = analyses
        .iter()
        .zip(saved)
        .zip(images)
        .enumerate()
        .map(|(i, ((analysis, paths), source))| PageReport {
            page: i + 1,
            source: source.to_string_lossy().into_owned(),
            analysis,
            image_paths: paths.iter().map(|p| p.to_string_lossy().into_owned()).collect(),
        })
        .collect();

    write_json(&reports, &output_dir.join("analysis.json"))?;
    write_json(&records, &output_dir.join("training_data.json"))?;

    let matches: usize = analyses.iter().map(|a| a.matches().count()).sum();
    info!("✅ Scanned {} page(s), {} matching region(s), {} training record(s)", images.len(), matches, records.len());
    Ok(())
}

fn split(image_path: &Path, output_dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let settings = ScanSettings::from_optional_file(config_path)?;
    let analyzer = Analyzer::builder().with_config(settings.analyzer_config()).build();
    let image = image::open(image_path)?;
    let pieces = analyzer.split(&image)?;

    std::fs::create_dir_all(output_dir)?;
    let saved = save_candidates(&pieces, 1, output_dir)?;
    for (path, bbox) in &saved {
        info!("Saved {:?} at ({}, {}) {}x{}", path, bbox.x, bbox.y, bbox.width, bbox.height);
    }

    info!("✅ Split into {} piece(s)", saved.len());
    Ok(())
}

fn classify(image_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let settings = ScanSettings::from_optional_file(config_path)?;
    let analyzer = build_analyzer(&settings);
    let image = image::open(image_path)?;
    let result = analyzer.analyze_image(&image)?;

    info!(
        "Features: circle={}, rectangles={}, lines={}, horizontal={}, target={}",
        result.features.has_circle,
        result.features.rectangles.len(),
        result.features.line_count,
        result.features.horizontal_line_count,
        result.features.is_target_pattern
    );
    println!("{}", result.description);
    Ok(())
}
