//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_dictionary_std::{tags, uids};
use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
use std::path::Path;

pub const SOP_INSTANCE: &str = "2.25.301220311532745634906531384172345982611";

/// Write a small 8-bit MONOCHROME2 image with a horizontal-then-vertical ramp.
pub fn write_ramp(path: &Path, size: u16, patient: Option<&str>) {
    let pixels: Vec<u8> = (0..(size as usize * size as usize))
        .map(|i| (i * 255 / (size as usize * size as usize - 1)) as u8)
        .collect();

    let mut elements = vec![
        DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
        ),
        DataElement::new(tags::SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from(SOP_INSTANCE)),
        DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("OT")),
        DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
        DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ),
        DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(size)),
        DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(size)),
        DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(8_u16)),
        DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(8_u16)),
        DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(7_u16)),
        DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16)),
        DataElement::new(tags::PIXEL_DATA, VR::OB, PrimitiveValue::from(pixels)),
    ];
    if let Some(name) = patient {
        elements.push(DataElement::new(
            tags::PATIENT_NAME,
            VR::PN,
            PrimitiveValue::from(name),
        ));
    }

    let obj = InMemDicomObject::from_element_iter(elements)
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::SECONDARY_CAPTURE_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(SOP_INSTANCE),
        )
        .unwrap();
    obj.write_to_file(path).unwrap();
}

/// The bytes of a Part 10 file as written by [`write_ramp`].
pub fn ramp_bytes(size: u16, patient: Option<&str>) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.dcm");
    write_ramp(&path, size, patient);
    std::fs::read(&path).unwrap()
}
