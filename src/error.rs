//! Error types for the gallery classifier.
//!
//! Uses thiserror for ergonomic error definitions. Orchestrators never
//! recover locally; every error propagates to the binary's top-level
//! handler.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for gallery classifier operations
#[derive(Error, Debug)]
pub enum GalleryError {
    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Error with model operations (weights, bundle members)
    #[error("Model error: {0}")]
    Model(String),

    /// Error during training
    #[error("Training error: {0}")]
    Training(String),

    /// Error during inference
    #[error("Inference error: {0}")]
    Inference(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Convenience Result type for gallery classifier operations
pub type Result<T> = std::result::Result<T, GalleryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GalleryError::Dataset("no images found".to_string());
        assert_eq!(format!("{}", err), "Dataset error: no images found");
    }

    #[test]
    fn test_path_not_found_display() {
        let err = GalleryError::PathNotFound(PathBuf::from("/missing/model.tar.gz"));
        assert!(format!("{}", err).contains("model.tar.gz"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GalleryError = io.into();
        assert!(matches!(err, GalleryError::Io(_)));
    }
}
