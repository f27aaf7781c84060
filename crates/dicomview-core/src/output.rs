//! Machine-readable summaries of decoded views.
//!
//! A [`ViewRecord`] is the serializable face of a [`DecodedView`]: everything
//! except the pixel buffer. [`OutputWriter`] emits records as JSON or JSON Lines.

use serde::Serialize;
use std::io::{self, Write};

use crate::decode::{Metadata, PatientName, TagId};
use crate::orchestrator::DecodedView;
use crate::pipe::BridgeReport;
use crate::runtime;
use crate::source::SourceLocator;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document, pretty-printed
    Json,
    /// One compact JSON object per line
    JsonLines,
}

/// One metadata element with its dictionary keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub value: String,
}

/// Summary of a decoded view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewRecord {
    pub source: SourceLocator,
    pub patient_name: PatientName,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeReport>,
    pub elapsed_ms: u64,
}

impl DecodedView {
    /// Summarize this view. Metadata is only listed when `include_metadata` is set.
    pub fn to_record(&self, include_metadata: bool) -> ViewRecord {
        ViewRecord {
            source: self.locator.clone(),
            patient_name: self.patient_name.clone(),
            width: self.bitmap.width,
            height: self.bitmap.height,
            metadata: if include_metadata {
                metadata_entries(&self.metadata)
            } else {
                Vec::new()
            },
            bridge: self.bridge.clone(),
            elapsed_ms: self.elapsed_ms,
        }
    }

    /// Summarize this view, listing only the requested tags that are present.
    pub fn to_selected_record(&self, tags: &[TagId]) -> ViewRecord {
        ViewRecord {
            metadata: metadata_entries(&self.metadata.select(tags)),
            ..self.to_record(false)
        }
    }
}

/// Flatten metadata into entries annotated with standard keywords.
pub fn metadata_entries(metadata: &Metadata) -> Vec<MetadataEntry> {
    metadata
        .iter()
        .map(|(tag, value)| MetadataEntry {
            tag: tag.to_string(),
            keyword: runtime::keyword(tag),
            value: value.to_string(),
        })
        .collect()
}

/// Writes serializable items as JSON or JSON Lines.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            items_written: 0,
        }
    }

    /// Write a single item.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => serde_json::to_writer_pretty(&mut self.writer, item),
            OutputFormat::JsonLines => serde_json::to_writer(&mut self.writer, item),
        }
        .map_err(io::Error::other)?;
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write a batch: a JSON array, or one line per item.
    pub fn write_batch<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, items).map_err(io::Error::other)?;
                writeln!(self.writer)?;
                self.items_written += items.len();
            }
            OutputFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
