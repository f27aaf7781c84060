//! DicomView Core - streaming DICOM decoding library.
//!
//! Bytes from a file or HTTP resource are copied by a dedicated bridge thread
//! into a bounded in-memory pipe. A decoder consumes the other end of the pipe
//! as an ordinary blocking reader, so the whole object never has to be held in
//! memory before parsing starts.
//!
//! # Architecture
//!
//! ```text
//! Source (file/URL) → StreamBridge → Pipe (bounded) → Decoder → RGBA bitmap
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use dicomview_core::{Config, Orchestrator, SourceLocator};
//!
//! #[tokio::main]
//! async fn main() -> dicomview_core::Result<()> {
//!     let config = Config::load()?;
//!     let orchestrator = Orchestrator::new(config);
//!
//!     let view = orchestrator.open(&SourceLocator::parse("./ct.dcm")).await?;
//!     println!("{} ({}x{})", view.patient_name.alphabetic, view.bitmap.width, view.bitmap.height);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod pipe;
pub mod render;
pub mod runtime;
pub mod source;

pub use config::Config;
pub use decode::{DatasetDecoder, DecodedDataset, DecodedFrame, DicomDecoder, Metadata, PatientName, TagId};
pub use error::{ConfigError, DecodeError, DecodeResult, DicomViewError, Result, SourceError};
pub use orchestrator::{DecodedView, Orchestrator};
pub use output::{OutputFormat, OutputWriter, ViewRecord};
pub use pipe::{pipe, BridgeOutcome, BridgeReport, CloseOutcome, PipeReader, PipeWriter, StreamBridge};
pub use render::{render_rgba, RenderedBitmap};
pub use source::{ByteSource, DicomDiscovery, SourceLocator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
