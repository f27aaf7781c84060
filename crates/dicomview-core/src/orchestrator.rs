//! Decode orchestration: source → pipe → bridge → decoder → render.
//!
//! The bridge thread is always started before the decoder, since the decoder
//! blocks on the pipe and the bridge is its only writer. Decoding runs on the
//! blocking pool, optionally under `limits.decode_timeout_ms`; dropping the
//! future or failing the decode aborts the pipe so neither side is left blocked.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::config::Config;
use crate::decode::{DatasetDecoder, DecodedDataset, DicomDecoder, Metadata, PatientName};
use crate::error::{DecodeError, Result};
use crate::pipe::{pipe, BridgeHandle, BridgeReport, StreamBridge};
use crate::render::{render_rgba, RenderedBitmap};
use crate::runtime;
use crate::source::{self, ByteSource, SourceLocator};

/// A decoded and rendered DICOM object.
#[derive(Debug)]
pub struct DecodedView {
    /// Where the bytes came from
    pub locator: SourceLocator,
    /// First frame as RGBA
    pub bitmap: RenderedBitmap,
    /// Patient name, or the "Undefined" placeholder
    pub patient_name: PatientName,
    /// Text metadata of the dataset
    pub metadata: Metadata,
    /// Bridge report, when the bridge finished within its close grace period
    pub bridge: Option<BridgeReport>,
    /// Total time from opening the source to the rendered bitmap
    pub elapsed_ms: u64,
}

/// Sequences a byte source through the bridge into a decoder.
pub struct Orchestrator {
    config: Config,
    decoder: Arc<dyn DatasetDecoder>,
}

impl Orchestrator {
    /// Create an orchestrator backed by the DICOM decoder.
    pub fn new(config: Config) -> Self {
        let decoder = DicomDecoder::new(config.limits.clone(), config.render.clone());
        Self::with_decoder(config, Arc::new(decoder))
    }

    /// Create an orchestrator with a custom decoder backend.
    pub fn with_decoder(config: Config, decoder: Arc<dyn DatasetDecoder>) -> Self {
        Self { config, decoder }
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open `locator`, decode it and render the first frame.
    pub async fn open(&self, locator: &SourceLocator) -> Result<DecodedView> {
        let start = Instant::now();
        if !runtime::initialize().dictionary_ready {
            tracing::warn!("Attribute dictionary unavailable, metadata keywords will be missing");
        }

        tracing::debug!("Opening {}", locator);
        let opened = source::open(locator, &self.config).await?;

        let mut view = self.decode_source(locator.clone(), opened.reader).await?;
        view.elapsed_ms = start.elapsed().as_millis() as u64;
        Ok(view)
    }

    /// Decode an already opened byte source.
    pub async fn decode_source(
        &self,
        locator: SourceLocator,
        source: ByteSource,
    ) -> Result<DecodedView> {
        let start = Instant::now();
        let (writer, reader) = pipe(self.config.pipe.capacity);
        let bridge = StreamBridge::new(source, writer, self.config.pipe.clone()).spawn()?;
        let mut guard = BridgeGuard(Some(bridge));

        let decoder = Arc::clone(&self.decoder);
        let decoder_name = decoder.name();
        tracing::debug!("Decoding {} with {}", locator, decoder_name);

        let task = tokio::task::spawn_blocking(move || decoder.decode(reader));
        let decode_result = match self.config.limits.decode_timeout() {
            Some(limit) => timeout(limit, task).await.map_err(|_| DecodeError::Timeout {
                timeout_ms: self.config.limits.decode_timeout_ms,
            }),
            None => Ok(task.await),
        };

        let decoded: std::result::Result<DecodedDataset, DecodeError> = match decode_result {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(DecodeError::Task(e.to_string())),
            Err(e) => Err(e),
        };

        let dataset = match decoded {
            Ok(dataset) => dataset,
            Err(e) => {
                // Dropping the guard aborts the pipe; the bridge winds down on its own.
                tracing::debug!("Decode of {} failed, cancelling bridge: {}", locator, e);
                drop(guard);
                return Err(e.into());
            }
        };

        let bridge = match guard.take() {
            Some(handle) => self.join_bridge(handle).await,
            None => None,
        };
        if let Some(report) = &bridge {
            if !report.outcome.is_complete() {
                tracing::warn!(
                    "Decoded {} but the stream ended early: {:?}",
                    locator,
                    report.outcome
                );
            }
        }

        let bitmap = render_rgba(&dataset.frame);
        let patient_name = dataset.metadata.patient_name(&PatientName::undefined());
        tracing::info!(
            "Decoded {}: {}x{}, patient {}",
            locator,
            bitmap.width,
            bitmap.height,
            patient_name.alphabetic
        );

        Ok(DecodedView {
            locator,
            bitmap,
            patient_name,
            metadata: dataset.metadata,
            bridge,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Wait for the bridge report, bounded by the close grace period.
    async fn join_bridge(&self, handle: BridgeHandle) -> Option<BridgeReport> {
        // The bridge may spend up to the close timeout on its handshake.
        let grace = self.config.pipe.close_timeout() + Duration::from_secs(1);
        match timeout(grace, tokio::task::spawn_blocking(move || handle.join())).await {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                tracing::warn!("Bridge join failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!("Bridge still running after {:?}, detaching", grace);
                None
            }
        }
    }
}

/// Cancels the bridge unless it was handed off for joining.
struct BridgeGuard(Option<BridgeHandle>);

impl BridgeGuard {
    fn take(&mut self) -> Option<BridgeHandle> {
        self.0.take()
    }
}

impl Drop for BridgeGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.cancel();
        }
    }
}
