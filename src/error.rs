//! Error types for the gridpop crate.

use std::path::PathBuf;

/// Errors that can occur during segmentation, compositing, and template
/// loading.
///
/// Layout parameter updates and template expressions never produce errors:
/// out-of-range values are clamped and unknown expression tokens evaluate
/// to zero, since both originate from continuous user input or best-effort
/// template authoring.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source bitmap could not be read or converted.
    #[error("could not read image: {0}")]
    InvalidImage(String),

    /// The segmentation model produced no usable mask (no person found, or
    /// every confidence value fell below the person threshold).
    #[error("no segmentation result")]
    NoSegmentationResult,

    /// A compositing step failed (degenerate crop, zero-area canvas,
    /// buffer allocation).
    #[error("rendering failed: {0}")]
    RenderFailed(String),

    /// The image format is not supported for output.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// A layout template file could not be parsed.
    #[error("invalid layout template {path}: {source}")]
    Template {
        /// Path of the offending template file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("tiff".to_string());
        assert!(unsupported.to_string().contains("tiff"));

        let no_mask = Error::NoSegmentationResult;
        assert!(no_mask.to_string().contains("no segmentation result"));

        let render = Error::RenderFailed("zero-area canvas".to_string());
        assert!(render.to_string().contains("zero-area canvas"));
    }

    #[test]
    fn template_error_names_the_file() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::Template {
            path: PathBuf::from("layouts/4-image-bad.json"),
            source,
        };
        assert!(err.to_string().contains("4-image-bad.json"));
    }
}
