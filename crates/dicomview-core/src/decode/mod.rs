//! The decoder contract and its DICOM backend.
//!
//! A decoder consumes the read end of a pipe and produces the first image
//! frame plus the dataset's text metadata. What happens inside (parsing,
//! transfer syntaxes, pixel decompression, LUTs) belongs to the backend.

pub mod dicom;
mod metadata;

pub use dicom::DicomDecoder;
pub use metadata::{Metadata, PatientName, TagId};

use crate::error::DecodeResult;
use crate::pipe::PipeReader;

/// Image type frames are decoded into.
pub type FrameImage = dicom_pixeldata::image::DynamicImage;

/// One decoded image frame.
pub struct DecodedFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// The decoded pixels, after the backend's modality and VOI transforms
    pub image: FrameImage,
}

impl DecodedFrame {
    /// Wrap a decoded image, taking the dimensions from it.
    pub fn new(image: FrameImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            image,
        }
    }
}

impl std::fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("color", &self.image.color())
            .finish()
    }
}

/// Everything a decoder hands back.
#[derive(Debug)]
pub struct DecodedDataset {
    /// First image frame
    pub frame: DecodedFrame,
    /// Text elements of the dataset
    pub metadata: Metadata,
}

/// A blocking decoder over a pipe's read end.
///
/// `decode` pulls bytes until it has a frame and metadata, or until the stream
/// ends or fails, in which case it returns a [`DecodeError`](crate::DecodeError).
/// Implementations run on a blocking thread.
pub trait DatasetDecoder: Send + Sync {
    /// Decode the stream behind `input`.
    fn decode(&self, input: PipeReader) -> DecodeResult<DecodedDataset>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str {
        "custom"
    }
}
