//! Error types for dicomview.
//!
//! Errors are split by where they surface: configuration, opening the byte
//! source, and decoding. Read errors inside the stream bridge never show up
//! here; they are reported through [`BridgeReport`](crate::pipe::BridgeReport).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for dicomview operations.
#[derive(Error, Debug)]
pub enum DicomViewError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The byte source could not be opened
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The decoder rejected the stream
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failures acquiring a byte source. These happen before any bridge starts.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Local file does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Local file exists but could not be opened or inspected
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the configured size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Remote resource could not be fetched
    #[error("HTTP error for {url}: {message}")]
    Http {
        url: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Directory holds no DICOM files, or the requested index is out of range
    #[error("No DICOM file at index {index} in {dir} ({available} available)")]
    NoSuchEntry {
        dir: PathBuf,
        index: usize,
        available: usize,
    },
}

/// Decoder failures. Terminal: nothing is rendered and nothing is retried.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Stream does not carry a DICOM preamble and magic code
    #[error("Not a DICOM stream: {0}")]
    NotDicom(String),

    /// Dataset could not be parsed
    #[error("Failed to parse dataset: {0}")]
    Parse(String),

    /// Dataset parsed but carries no usable image
    #[error("No image in dataset: {0}")]
    NoImage(String),

    /// Pixel data could not be decoded into a frame
    #[error("Failed to decode pixel data: {0}")]
    PixelData(String),

    /// Image dimensions exceed the configured limits
    #[error("Image too large: {width}x{height} > {max_width}x{max_height}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    /// Stream ended or failed before the decoder had enough data
    #[error("Stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// Decoding did not finish in time
    #[error("Decode timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The blocking decode task died
    #[error("Decode task failed: {0}")]
    Task(String),
}

/// Convenience type alias for dicomview results.
pub type Result<T> = std::result::Result<T, DicomViewError>;

/// Convenience type alias for decoder results.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
