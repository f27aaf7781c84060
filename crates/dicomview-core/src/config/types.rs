//! Sub-configuration structs with defaults matching the observed viewer settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Handoff pipe and stream bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// Bytes the pipe buffers before the producer blocks
    pub capacity: usize,

    /// Size of the staging buffer each source read lands in
    pub transfer_buffer_size: usize,

    /// How long the producer waits for the consumer to drain on close
    pub close_timeout_ms: u64,

    /// Close the pipe with an error (instead of a clean end of stream)
    /// when the source fails mid-transfer
    pub propagate_source_errors: bool,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            capacity: 32_000,
            transfer_buffer_size: 128_000,
            close_timeout_ms: 50_000,
            propagate_source_errors: false,
        }
    }
}

impl PipeConfig {
    /// Close grace period as a `Duration`.
    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum image width in pixels
    pub max_image_width: u32,

    /// Maximum image height in pixels
    pub max_image_height: u32,

    /// Maximum local file size in megabytes
    pub max_file_size_mb: u64,

    /// Upper bound on a whole decode in milliseconds (0 disables it)
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_width: 8000,
            max_image_height: 8000,
            max_file_size_mb: 1024,
            decode_timeout_ms: 0,
        }
    }
}

impl LimitsConfig {
    /// Decode deadline, or `None` when decodes may run as long as bytes arrive.
    pub fn decode_timeout(&self) -> Option<Duration> {
        (self.decode_timeout_ms > 0).then(|| Duration::from_millis(self.decode_timeout_ms))
    }
}

/// Byte source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Connect timeout for remote sources in milliseconds
    pub http_connect_timeout_ms: u64,

    /// Network chunks buffered ahead of the bridge for remote sources
    pub http_chunk_queue: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            http_connect_timeout_ms: 30_000,
            http_chunk_queue: 16,
        }
    }
}

/// Rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Window grayscale frames to their full value range, ignoring any
    /// window stored in the dataset
    pub auto_window: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { auto_window: true }
    }
}

/// Directory discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Descend into subdirectories
    pub recursive: bool,

    /// Extensions accepted without sniffing the preamble
    pub extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: vec!["dcm".to_string(), "dicom".to_string()],
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
