//! Process-wide decoder runtime setup.
//!
//! The attribute dictionary behind the DICOM backend is built lazily on first
//! lookup. [`initialize`] forces that once per process so the first decode
//! does not pay for it, and is safe to call any number of times.

use dicom_core::dictionary::{DataDictionary, DataDictionaryEntry};
use dicom_core::Tag;
use dicom_dictionary_std::StandardDataDictionary;
use std::sync::OnceLock;

use crate::decode::TagId;

/// Facts about the initialized decoder runtime.
#[derive(Debug)]
pub struct DecoderRuntime {
    /// Whether the attribute dictionary resolved a known tag
    pub dictionary_ready: bool,
}

static RUNTIME: OnceLock<DecoderRuntime> = OnceLock::new();

/// Initialize the decoder runtime if it has not been already.
///
/// Every call returns the same instance.
pub fn initialize() -> &'static DecoderRuntime {
    RUNTIME.get_or_init(|| {
        let dictionary_ready = StandardDataDictionary
            .by_tag(TagId::PATIENT_NAME.into())
            .is_some();
        tracing::debug!(
            "Decoder runtime initialized (dictionary ready: {})",
            dictionary_ready
        );
        DecoderRuntime { dictionary_ready }
    })
}

/// Whether [`initialize`] has run in this process.
pub fn is_initialized() -> bool {
    RUNTIME.get().is_some()
}

/// Standard keyword for a tag (e.g. `PatientName`), if the dictionary knows it.
pub fn keyword(tag: TagId) -> Option<String> {
    initialize();
    StandardDataDictionary
        .by_tag(Tag::from(tag))
        .map(|entry| entry.alias().to_string())
}
