use std::path::Path;
use std::process::Command;

use diagram::{Captioner, DiagramError, TextExtractor};
use image::DynamicImage;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{CaptionCommand, TesseractSettings};

/// Write the image to a temporary PNG that lives as long as the returned handle
fn temp_png(image: &DynamicImage) -> diagram::Result<NamedTempFile> {
    let temp_file = NamedTempFile::with_suffix(".png")?;
    image.save_with_format(temp_file.path(), image::ImageFormat::Png)?;
    Ok(temp_file)
}

/// Run a program and return its stdout, mapping every failure to an unavailable collaborator
fn run_for_stdout(mut command: Command, name: &str) -> diagram::Result<String> {
    let output = command
        .output()
        .map_err(|e| DiagramError::CollaboratorUnavailable(format!("Failed to execute {}: {}", name, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiagramError::CollaboratorUnavailable(format!(
            "{} failed ({}): {}",
            name,
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// OCR through the `tesseract` command line tool
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    settings: TesseractSettings,
}

impl TesseractExtractor {
    pub fn new(settings: TesseractSettings) -> Self {
        Self { settings }
    }

    fn command(&self, image_path: &Path, language_hint: &str) -> Command {
        let mut command = Command::new(&self.settings.binary);
        // "stdout" as the output base makes tesseract print instead of writing a file
        command.arg(image_path).arg("stdout");
        if !language_hint.is_empty() {
            command.args(["-l", language_hint]);
        }
        command.args(&self.settings.args);
        command
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract_text(&self, image: &DynamicImage, language_hint: &str) -> diagram::Result<String> {
        let temp_file = temp_png(image)?;
        debug!(binary = %self.settings.binary, language = language_hint, "Running tesseract");
        run_for_stdout(self.command(temp_file.path(), language_hint), &self.settings.binary)
    }
}

/// Captions from an external program that prints to stdout
#[derive(Debug, Clone)]
pub struct CommandCaptioner {
    command: CaptionCommand,
}

impl CommandCaptioner {
    pub fn new(command: CaptionCommand) -> Self {
        Self { command }
    }
}

impl Captioner for CommandCaptioner {
    fn caption(&self, image: &DynamicImage) -> diagram::Result<String> {
        let temp_file = temp_png(image)?;
        let mut command = Command::new(&self.command.program);
        command.args(&self.command.args).arg(temp_file.path());

        debug!(program = %self.command.program, "Running caption command");
        let caption = run_for_stdout(command, &self.command.program)?;
        Ok(caption.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> DynamicImage {
        DynamicImage::new_luma8(8, 8)
    }

    #[test]
    fn test_missing_tesseract_is_unavailable() {
        let extractor = TesseractExtractor::new(TesseractSettings {
            binary: "definitely-not-a-tesseract-binary".to_string(),
            ..TesseractSettings::default()
        });
        assert!(matches!(
            extractor.extract_text(&image(), "eng"),
            Err(DiagramError::CollaboratorUnavailable(_))
        ));
    }

    #[test]
    fn test_tesseract_arguments() {
        let extractor = TesseractExtractor::new(TesseractSettings::default());
        let command = extractor.command(Path::new("/tmp/region.png"), "chi_tra");
        let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["/tmp/region.png", "stdout", "-l", "chi_tra", "--oem", "3", "--psm", "3"]);
    }

    #[test]
    fn test_empty_language_hint_omits_flag() {
        let extractor = TesseractExtractor::new(TesseractSettings::default());
        let command = extractor.command(Path::new("a.png"), "");
        assert!(command.get_args().all(|a| a != "-l"));
    }

    #[cfg(unix)]
    #[test]
    fn test_caption_command_reads_stdout() {
        let captioner = CommandCaptioner::new(CaptionCommand {
            program: "echo".to_string(),
            args: vec!["a circle".to_string()],
        });
        let caption = captioner.caption(&image()).unwrap();
        assert!(caption.starts_with("a circle "));
        assert!(caption.ends_with(".png"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_caption_command_is_unavailable() {
        let captioner = CommandCaptioner::new(CaptionCommand { program: "false".to_string(), args: vec![] });
        assert!(matches!(captioner.caption(&image()), Err(DiagramError::CollaboratorUnavailable(_))));
    }
}
