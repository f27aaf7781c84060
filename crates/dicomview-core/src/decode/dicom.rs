//! DICOM backend built on the dicom-rs crates.
//!
//! The stream is consumed strictly sequentially: the 128-byte preamble and
//! `DICM` magic are checked here, the rest goes to `dicom_object`, and the
//! first frame is rendered through `dicom_pixeldata`.

use dicom_core::header::Header;
use dicom_core::value::Value;
use dicom_core::{Tag, VR};
use dicom_object::{DefaultDicomObject, OpenFileOptions};
use dicom_pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption};
use std::io::{self, Cursor, Read};

use super::metadata::{Metadata, TagId};
use super::{DatasetDecoder, DecodedDataset, DecodedFrame};
use crate::config::{LimitsConfig, RenderConfig};
use crate::error::{DecodeError, DecodeResult};
use crate::pipe::PipeReader;

/// Length of the file preamble preceding the magic code.
pub const PREAMBLE_LEN: usize = 128;

/// Magic code following the preamble.
pub const DICOM_MAGIC: &[u8; 4] = b"DICM";

/// Decoder for DICOM Part 10 streams.
pub struct DicomDecoder {
    limits: LimitsConfig,
    render: RenderConfig,
}

impl DicomDecoder {
    /// Create a new decoder with the given limits and render settings.
    pub fn new(limits: LimitsConfig, render: RenderConfig) -> Self {
        Self { limits, render }
    }

    /// Decode from any reader positioned at the start of a Part 10 stream.
    pub fn decode_reader<R: Read + 'static>(&self, mut input: R) -> DecodeResult<DecodedDataset> {
        read_preamble(&mut input)?;

        let stream = Cursor::new(DICOM_MAGIC.to_vec()).chain(input);
        let obj = OpenFileOptions::new()
            .from_reader(stream)
            .map_err(|e| DecodeError::Parse(e.to_string()))?;

        tracing::debug!(
            "Parsed dataset, transfer syntax {}",
            obj.meta().transfer_syntax()
        );

        self.check_dimensions(&obj)?;
        let frame = self.decode_first_frame(&obj)?;
        let metadata = collect_metadata(&obj);

        Ok(DecodedDataset { frame, metadata })
    }

    fn check_dimensions(&self, obj: &DefaultDicomObject) -> DecodeResult<()> {
        let width = read_dimension(obj, TagId::COLUMNS, "Columns")?;
        let height = read_dimension(obj, TagId::ROWS, "Rows")?;

        if width > self.limits.max_image_width || height > self.limits.max_image_height {
            return Err(DecodeError::ImageTooLarge {
                width,
                height,
                max_width: self.limits.max_image_width,
                max_height: self.limits.max_image_height,
            });
        }
        Ok(())
    }

    fn decode_first_frame(&self, obj: &DefaultDicomObject) -> DecodeResult<DecodedFrame> {
        let pixels = obj
            .decode_pixel_data()
            .map_err(|e| DecodeError::PixelData(e.to_string()))?;

        let has_window = obj.element(TagId::WINDOW_CENTER.into()).is_ok();
        let options =
            ConvertOptions::new().with_voi_lut(voi_option(self.render.auto_window, has_window));

        let image = pixels
            .to_dynamic_image_with_options(0, &options)
            .map_err(|e| DecodeError::PixelData(e.to_string()))?;

        Ok(DecodedFrame::new(image))
    }
}

impl Default for DicomDecoder {
    fn default() -> Self {
        Self::new(LimitsConfig::default(), RenderConfig::default())
    }
}

impl DatasetDecoder for DicomDecoder {
    fn decode(&self, input: PipeReader) -> DecodeResult<DecodedDataset> {
        self.decode_reader(input)
    }

    fn name(&self) -> &'static str {
        "dicom-rs"
    }
}

/// Consume the preamble and magic code, rejecting streams that lack them.
fn read_preamble<R: Read>(input: &mut R) -> DecodeResult<()> {
    let mut header = [0u8; PREAMBLE_LEN + 4];
    let mut filled = 0;
    while filled < header.len() {
        match input.read(&mut header[filled..]) {
            Ok(0) => {
                return Err(DecodeError::NotDicom(format!(
                    "stream ended after {} bytes",
                    filled
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(DecodeError::Stream(e)),
        }
    }

    if &header[PREAMBLE_LEN..] != DICOM_MAGIC {
        return Err(DecodeError::NotDicom(
            "missing DICM magic after preamble".to_string(),
        ));
    }
    Ok(())
}

/// Computed window when `auto_window` is on, else the dataset's own window if any.
fn voi_option(auto_window: bool, has_window: bool) -> VoiLutOption {
    match (auto_window, has_window) {
        (true, _) => VoiLutOption::Normalize,
        (false, true) => VoiLutOption::Default,
        (false, false) => VoiLutOption::Identity,
    }
}

fn read_dimension(obj: &DefaultDicomObject, tag: TagId, name: &str) -> DecodeResult<u32> {
    obj.element(tag.into())
        .map_err(|_| DecodeError::NoImage(format!("missing {} {}", name, tag)))?
        .to_int::<u32>()
        .map_err(|e| DecodeError::NoImage(format!("bad {} {}: {}", name, tag, e)))
}

/// Text of every primitive, non-binary element outside the pixel data.
fn collect_metadata(obj: &DefaultDicomObject) -> Metadata {
    let mut metadata = Metadata::new();

    for elem in &**obj {
        let tag: Tag = elem.tag();
        if tag.0 == TagId::PIXEL_DATA.group() {
            continue;
        }
        if matches!(
            elem.vr(),
            VR::OB | VR::OW | VR::OF | VR::OD | VR::OL | VR::OV | VR::UN | VR::SQ
        ) {
            continue;
        }
        if let Value::Primitive(value) = elem.value() {
            let text = value.to_str();
            let text = text.trim_end_matches(['\0', ' ']);
            metadata.insert(tag.into(), text);
        }
    }

    metadata
}
