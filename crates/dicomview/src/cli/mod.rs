//! Subcommand implementations.

pub mod config;
pub mod list;
pub mod open;

use clap::ValueEnum;
use dicomview_core::OutputFormat as CoreOutputFormat;

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl OutputFormat {
    /// The machine-readable format, or `None` for text.
    pub fn record_format(self) -> Option<CoreOutputFormat> {
        match self {
            OutputFormat::Text => None,
            OutputFormat::Json => Some(CoreOutputFormat::Json),
            OutputFormat::Jsonl => Some(CoreOutputFormat::JsonLines),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}
