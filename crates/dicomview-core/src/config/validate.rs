//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipe.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "pipe.capacity must be > 0".into(),
            ));
        }
        if self.pipe.transfer_buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipe.transfer_buffer_size must be > 0".into(),
            ));
        }
        if self.limits.max_image_width == 0 || self.limits.max_image_height == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_width and limits.max_image_height must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.source.http_connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "source.http_connect_timeout_ms must be > 0".into(),
            ));
        }
        if self.source.http_chunk_queue == 0 {
            return Err(ConfigError::ValidationError(
                "source.http_chunk_queue must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}
