//! The stream bridge: a producer task copying a byte source into a pipe.
//!
//! Each successful read from the source becomes exactly one forwarded chunk.
//! Source errors end the copy without reaching the consumer unless
//! [`PipeConfig::propagate_source_errors`] is set; the consumer normally sees a
//! (possibly truncated) stream followed by a clean end of stream. The outcome
//! is reported to whoever joins the bridge.

use serde::Serialize;
use std::any::Any;
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::channel::{CloseOutcome, PipeHandle, PipeStats, PipeWriter};
use crate::config::PipeConfig;

/// Pause before retrying a source that reported `WouldBlock`.
const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(1);

/// Reusable staging buffer for source reads.
///
/// Only the span filled by the most recent read is ever exposed, so bytes
/// left over from an earlier, larger read cannot leak into the next chunk.
pub struct TransferBuffer {
    buf: Box<[u8]>,
    filled: usize,
}

impl TransferBuffer {
    /// Allocate a buffer of `capacity` bytes (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(1)].into_boxed_slice(),
            filled: 0,
        }
    }

    /// Total size of the buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Read once from `source` and return exactly the bytes that read produced.
    ///
    /// An empty slice means end of stream. On error the filled view is empty.
    pub fn fill<R: Read + ?Sized>(&mut self, source: &mut R) -> io::Result<&[u8]> {
        self.filled = 0;
        let n = source.read(&mut self.buf)?;
        self.filled = n.min(self.buf.len());
        Ok(&self.buf[..self.filled])
    }

    /// The bytes from the last successful [`fill`](Self::fill).
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }
}

/// Why the copy loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum BridgeOutcome {
    /// The source reported end of stream
    Completed,
    /// The source returned a read error; the stream is truncated
    SourceFailed(String),
    /// The consumer released its end before the source was exhausted
    ConsumerGone,
    /// The bridge was cancelled or the pipe aborted
    Cancelled,
    /// The source panicked mid-read
    Panicked(String),
}

impl BridgeOutcome {
    /// Whether every byte of the source reached the pipe.
    pub fn is_complete(&self) -> bool {
        matches!(self, BridgeOutcome::Completed)
    }
}

/// What a finished bridge run did.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeReport {
    /// Bytes forwarded into the pipe
    pub bytes_forwarded: u64,
    /// Number of non-empty source reads forwarded
    pub chunks_forwarded: u64,
    /// Why the copy loop ended
    pub outcome: BridgeOutcome,
    /// Result of the producer-side close handshake
    pub close: CloseOutcome,
    /// Pipe counters after the close
    pub pipe: PipeStats,
    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,
}

#[derive(Default)]
struct Progress {
    bytes: u64,
    chunks: u64,
}

/// Copies a byte source into the write end of a pipe.
pub struct StreamBridge<R> {
    source: R,
    writer: PipeWriter,
    config: PipeConfig,
    cancel: Arc<AtomicBool>,
}

impl<R: Read> StreamBridge<R> {
    /// Create a bridge that will drain `source` into `writer`.
    pub fn new(source: R, writer: PipeWriter, config: PipeConfig) -> Self {
        Self {
            source,
            writer,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run the copy loop on the current thread.
    ///
    /// The write end is closed exactly once on every exit path, including a
    /// panicking source, using the configured close grace period.
    pub fn run(self) -> BridgeReport {
        let StreamBridge {
            mut source,
            mut writer,
            config,
            cancel,
        } = self;

        let start = Instant::now();
        let mut buffer = TransferBuffer::new(config.transfer_buffer_size);
        let mut progress = Progress::default();

        tracing::debug!(
            buffer = buffer.capacity(),
            "Stream bridge started"
        );

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| {
            copy_loop(&mut source, &mut writer, &mut buffer, &cancel, &mut progress)
        })) {
            Ok(outcome) => outcome,
            Err(payload) => BridgeOutcome::Panicked(panic_message(payload.as_ref())),
        };

        let handle = writer.handle();
        let close = match (&outcome, config.propagate_source_errors) {
            (BridgeOutcome::SourceFailed(message), true)
            | (BridgeOutcome::Panicked(message), true) => {
                writer.close_with_error(message.clone(), config.close_timeout())
            }
            _ => writer.close(config.close_timeout()),
        };
        drop(source);

        if close == CloseOutcome::TimedOut {
            tracing::debug!(
                "Consumer did not release the pipe within {}ms",
                config.close_timeout_ms
            );
        }

        let report = BridgeReport {
            bytes_forwarded: progress.bytes,
            chunks_forwarded: progress.chunks,
            outcome,
            close,
            pipe: handle.stats(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        tracing::debug!(
            "Stream bridge finished: {} bytes in {} chunks ({:?})",
            report.bytes_forwarded,
            report.chunks_forwarded,
            report.outcome
        );
        report
    }
}

impl<R: Read + Send + 'static> StreamBridge<R> {
    /// Run the bridge on a dedicated thread.
    pub fn spawn(self) -> io::Result<BridgeHandle> {
        let cancel = Arc::clone(&self.cancel);
        let pipe = self.writer.handle();
        let thread = thread::Builder::new()
            .name("stream-bridge".to_string())
            .spawn(move || self.run())?;

        Ok(BridgeHandle {
            thread,
            cancel,
            pipe,
        })
    }
}

fn copy_loop<R: Read + ?Sized>(
    source: &mut R,
    writer: &mut PipeWriter,
    buffer: &mut TransferBuffer,
    cancel: &AtomicBool,
    progress: &mut Progress,
) -> BridgeOutcome {
    loop {
        if cancel.load(Ordering::Acquire) {
            return BridgeOutcome::Cancelled;
        }

        let chunk = match buffer.fill(source) {
            Ok(chunk) if chunk.is_empty() => return BridgeOutcome::Completed,
            Ok(chunk) => chunk,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(WOULD_BLOCK_BACKOFF);
                continue;
            }
            Err(e) => {
                tracing::warn!(
                    "Source read failed after {} bytes, ending stream: {}",
                    progress.bytes,
                    e
                );
                return BridgeOutcome::SourceFailed(e.to_string());
            }
        };

        if writer.write_all(chunk).is_err() {
            return if writer.handle().is_aborted() {
                BridgeOutcome::Cancelled
            } else {
                BridgeOutcome::ConsumerGone
            };
        }

        progress.bytes += chunk.len() as u64;
        progress.chunks += 1;
        tracing::trace!("Forwarded {} bytes", chunk.len());
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "source panicked".to_string()
    }
}

/// Handle to a bridge running on its own thread.
pub struct BridgeHandle {
    thread: JoinHandle<BridgeReport>,
    cancel: Arc<AtomicBool>,
    pipe: PipeHandle,
}

impl BridgeHandle {
    /// Stop the bridge: no further reads are forwarded and both pipe ends are
    /// woken. The bridge still performs its close before exiting.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
        self.pipe.abort("stream bridge cancelled");
    }

    /// Wait for the bridge to finish and collect its report.
    pub fn join(self) -> BridgeReport {
        match self.thread.join() {
            Ok(report) => report,
            Err(payload) => {
                let stats = self.pipe.stats();
                BridgeReport {
                    bytes_forwarded: stats.bytes_written,
                    chunks_forwarded: 0,
                    outcome: BridgeOutcome::Panicked(panic_message(payload.as_ref())),
                    close: CloseOutcome::TimedOut,
                    pipe: stats,
                    elapsed_ms: 0,
                }
            }
        }
    }
}
