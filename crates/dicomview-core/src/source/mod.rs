//! Byte sources the bridge can drain.
//!
//! A source is anything implementing `Read + Send`. This module opens the two
//! kinds the viewer knows about (local files and HTTP resources) and lists
//! DICOM files in a directory.

pub mod discovery;
pub mod file;
pub mod http;

pub use discovery::{DicomDiscovery, DiscoveredFile};
pub use http::HttpSource;

use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::SourceError;

/// A sequential byte stream of unknown length.
pub type ByteSource = Box<dyn Read + Send>;

/// Where to read a DICOM object from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum SourceLocator {
    /// Local file path
    File(PathBuf),
    /// Remote resource fetched over HTTP(S)
    Url(String),
}

impl SourceLocator {
    /// Classify a user-supplied location. `http://` and `https://` prefixes
    /// select a remote source, anything else is treated as a path.
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(input.to_string())
        } else {
            Self::File(PathBuf::from(input))
        }
    }
}

impl From<PathBuf> for SourceLocator {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// An opened source, ready to hand to a bridge.
pub struct OpenedSource {
    /// The stream itself
    pub reader: ByteSource,
    /// Total length when the source knows it up front
    pub len: Option<u64>,
}

impl fmt::Debug for OpenedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedSource").field("len", &self.len).finish()
    }
}

/// Open the source behind `locator`.
///
/// Failures here happen before any bytes move, so the caller can report them
/// without a bridge ever starting.
pub async fn open(locator: &SourceLocator, config: &Config) -> Result<OpenedSource, SourceError> {
    match locator {
        SourceLocator::File(path) => {
            let (file, len) = file::open_file(path, &config.limits)?;
            Ok(OpenedSource {
                reader: Box::new(file),
                len: Some(len),
            })
        }
        SourceLocator::Url(url) => {
            let source = http::open_url(url, &config.source).await?;
            let len = source.content_length();
            Ok(OpenedSource {
                reader: Box::new(source),
                len,
            })
        }
    }
}
