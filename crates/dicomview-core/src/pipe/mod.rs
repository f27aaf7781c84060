//! Producer/consumer plumbing between a byte source and a decoder.
//!
//! - **channel**: bounded blocking byte pipe with a `Read` consumer end
//! - **bridge**: background task draining a source into the pipe

pub mod bridge;
pub mod channel;

pub use bridge::{BridgeHandle, BridgeOutcome, BridgeReport, StreamBridge, TransferBuffer};
pub use channel::{pipe, CloseOutcome, PipeHandle, PipeReader, PipeStats, PipeWriter};
