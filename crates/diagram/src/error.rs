use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Region analysis failed: {0}")]
    RegionAnalysis(String),

    #[error("External collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiagramError>;
