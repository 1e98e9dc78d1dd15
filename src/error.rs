//! Error types for the glTF exporter.

use thiserror::Error;

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failed to write a ZIP archive.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Failed to serialize or parse JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to decode or encode an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The geometry codec rejected the mesh.
    #[error("Compression error: {0}")]
    Compression(String),

    /// A texture could not be resolved to an image.
    #[error("Texture error: {0}")]
    Texture(String),

    /// Caller-supplied data is unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failed to export the document.
    #[error("Export error: {0}")]
    Export(String),
}
