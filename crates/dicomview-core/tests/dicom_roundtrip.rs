//! End-to-end decoding of Part 10 files written to disk.

mod common;

use common::write_ramp;
use dicomview_core::{
    BridgeOutcome, Config, DecodeError, DicomViewError, Orchestrator, SourceLocator, TagId,
};
use std::path::PathBuf;

fn config() -> Config {
    let mut config = Config::default();
    config.pipe.close_timeout_ms = 5_000;
    config
}

#[tokio::test]
async fn decodes_file_through_pipe() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.dcm");
    write_ramp(&path, 64, Some("Doe^Jane"));

    let view = Orchestrator::new(config())
        .open(&SourceLocator::File(path.clone()))
        .await
        .unwrap();

    assert_eq!(view.bitmap.width, 64);
    assert_eq!(view.bitmap.height, 64);
    assert_eq!(view.bitmap.pixels.len(), 64 * 64 * 4);
    assert_eq!(view.patient_name.alphabetic, "Doe^Jane");
    assert_eq!(view.patient_name.display_name(), "Jane Doe");
    assert_eq!(view.metadata.get(TagId::MODALITY), Some("OT"));

    let first = view.bitmap.pixel(0, 0).unwrap();
    let last = view.bitmap.pixel(63, 63).unwrap();
    assert_eq!(first[0], first[1]);
    assert_eq!(first[1], first[2]);
    assert_eq!(first[3], 255);
    assert!(first[0] < last[0]);

    let report = view.bridge.unwrap();
    assert_eq!(report.outcome, BridgeOutcome::Completed);
    assert_eq!(report.bytes_forwarded, std::fs::metadata(&path).unwrap().len());
    assert_eq!(report.pipe.producer_closes, 1);
}

#[tokio::test]
async fn small_pipe_still_decodes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.dcm");
    write_ramp(&path, 128, Some("Roe^Richard"));

    let mut config = config();
    config.pipe.capacity = 512;
    config.pipe.transfer_buffer_size = 700;

    let view = Orchestrator::new(config)
        .open(&SourceLocator::File(path))
        .await
        .unwrap();

    assert_eq!(view.bitmap.width, 128);
    let report = view.bridge.unwrap();
    assert!(report.pipe.peak_buffered <= 512);
    assert!(report.chunks_forwarded > 1);
}

#[tokio::test]
async fn missing_patient_name_is_undefined() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anon.dcm");
    write_ramp(&path, 8, None);

    let view = Orchestrator::new(config())
        .open(&SourceLocator::File(path))
        .await
        .unwrap();

    assert_eq!(view.patient_name.alphabetic, "Undefined");
    assert_eq!(view.patient_name.ideographic, "");
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.dcm");
    write_ramp(&path, 32, Some("Doe^Jane"));

    let mut config = config();
    config.limits.max_image_width = 16;

    let err = Orchestrator::new(config)
        .open(&SourceLocator::File(path))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DicomViewError::Decode(DecodeError::ImageTooLarge {
            width: 32,
            max_width: 16,
            ..
        })
    ));
}

#[tokio::test]
async fn non_dicom_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("notes.dcm");
    std::fs::write(&path, "not a DICOM file".repeat(64)).unwrap();

    let err = Orchestrator::new(config())
        .open(&SourceLocator::File(path))
        .await
        .unwrap_err();

    assert!(matches!(err, DicomViewError::Decode(DecodeError::NotDicom(_))));
}

#[tokio::test]
async fn directory_selection_uses_name_order() {
    let dir = tempfile::tempdir().unwrap();
    write_ramp(&dir.path().join("b.dcm"), 8, Some("Second"));
    write_ramp(&dir.path().join("a.dcm"), 8, Some("First"));
    // No extension, found by its preamble.
    write_ramp(&dir.path().join("c"), 8, Some("Third"));

    let discovery = dicomview_core::DicomDiscovery::new(Default::default());
    let files = discovery.discover(dir.path());
    assert_eq!(files.len(), 3);

    let selected = discovery.select(dir.path(), 2).unwrap();
    let view = Orchestrator::new(config())
        .open(&SourceLocator::File(selected.path))
        .await
        .unwrap();
    assert_eq!(view.patient_name.alphabetic, "Third");
}
