use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for the SEEDS superpixel engine and its tooling
#[derive(Error, Debug)]
pub enum SeedsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid tunable (bins, neighborhood, confidence, ...), rejected before any work is done
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoad {
        source: toml::de::Error,
        path: PathBuf,
    },

    /// The pixel grid cannot be segmented (empty, zero-sized, malformed)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Label map and histograms disagree; the engine state can no longer be trusted
    #[error("Internal consistency failure: {0}")]
    Invariant(String),

    #[error("Engine has not been initialized")]
    NotInitialized,

    #[error("Engine has already been initialized")]
    AlreadyInitialized,

    #[error("Unsupported color space: {0}")]
    UnsupportedColorSpace(String),

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, SeedsError>;
