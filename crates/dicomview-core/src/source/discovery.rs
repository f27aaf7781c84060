//! Finding DICOM files in a directory.

use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;
use crate::decode::dicom::{DICOM_MAGIC, PREAMBLE_LEN};
use crate::error::SourceError;

/// Discovers DICOM files in directories.
pub struct DicomDiscovery {
    config: DiscoveryConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl DicomDiscovery {
    /// Create a new discovery instance.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// List the DICOM files at `path`, ordered by file name.
    ///
    /// A file path yields itself when it looks like DICOM. A directory is
    /// scanned one level deep unless `recursive` is configured. A file counts as
    /// DICOM when its extension is in the configured list or it carries the
    /// `DICM` magic after the 128-byte preamble.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        let walker = if self.config.recursive {
            WalkDir::new(path).follow_links(true)
        } else {
            WalkDir::new(path).follow_links(true).max_depth(1)
        };

        let mut files: Vec<DiscoveredFile> = walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.is_dicom(entry.path()))
            .filter_map(|entry| {
                let size = entry.metadata().ok()?.len();
                Some(DiscoveredFile {
                    path: entry.into_path(),
                    size,
                })
            })
            .collect();

        files.sort_by(|a, b| {
            a.path
                .file_name()
                .cmp(&b.path.file_name())
                .then_with(|| a.path.cmp(&b.path))
        });
        files
    }

    /// Pick the `index`-th DICOM file (in name order) from `dir`.
    pub fn select(&self, dir: &Path, index: usize) -> Result<DiscoveredFile, SourceError> {
        let mut files = self.discover(dir);
        let available = files.len();
        if index >= available {
            return Err(SourceError::NoSuchEntry {
                dir: dir.to_path_buf(),
                index,
                available,
            });
        }
        Ok(files.swap_remove(index))
    }

    fn is_dicom(&self, path: &Path) -> bool {
        self.has_dicom_extension(path) || sniff_preamble(path)
    }

    fn has_dicom_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

/// Whether a header starts with a DICOM preamble followed by `DICM`.
fn has_dicom_preamble(header: &[u8]) -> bool {
    header.len() >= PREAMBLE_LEN + DICOM_MAGIC.len()
        && &header[PREAMBLE_LEN..PREAMBLE_LEN + DICOM_MAGIC.len()] == DICOM_MAGIC
}

fn sniff_preamble(path: &Path) -> bool {
    let mut header = [0u8; PREAMBLE_LEN + 4];
    File::open(path)
        .and_then(|mut file| file.read_exact(&mut header))
        .map(|()| has_dicom_preamble(&header))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dicom_header() -> Vec<u8> {
        let mut bytes = vec![0u8; PREAMBLE_LEN];
        bytes.extend_from_slice(b"DICM");
        bytes.extend_from_slice(&[0u8; 16]);
        bytes
    }

    #[test]
    fn test_has_dicom_preamble() {
        assert!(has_dicom_preamble(&dicom_header()));
        assert!(!has_dicom_preamble(&[0u8; 132]));
        assert!(!has_dicom_preamble(&[0u8; 10]));
    }

    #[test]
    fn test_discover_sorts_by_name_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.dcm"), b"anything").unwrap();
        std::fs::write(dir.path().join("a_no_extension"), dicom_header()).unwrap();
        std::fs::write(dir.path().join("c.DCM"), b"anything").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not dicom").unwrap();

        let discovery = DicomDiscovery::new(DiscoveryConfig::default());
        let names: Vec<_> = discovery
            .discover(dir.path())
            .into_iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a_no_extension", "b.dcm", "c.DCM"]);
    }

    #[test]
    fn test_discover_non_recursive_by_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("series")).unwrap();
        std::fs::write(dir.path().join("series/1.dcm"), b"x").unwrap();
        std::fs::write(dir.path().join("top.dcm"), b"x").unwrap();

        let flat = DicomDiscovery::new(DiscoveryConfig::default());
        assert_eq!(flat.discover(dir.path()).len(), 1);

        let deep = DicomDiscovery::new(DiscoveryConfig {
            recursive: true,
            ..DiscoveryConfig::default()
        });
        assert_eq!(deep.discover(dir.path()).len(), 2);
    }

    #[test]
    fn test_select_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("only.dcm"), b"x").unwrap();

        let discovery = DicomDiscovery::new(DiscoveryConfig::default());
        assert!(discovery.select(dir.path(), 0).is_ok());
        let err = discovery.select(dir.path(), 3).unwrap_err();
        assert!(matches!(err, SourceError::NoSuchEntry { available: 1, .. }));
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.dcm");
        std::fs::write(&path, b"x").unwrap();

        let discovery = DicomDiscovery::new(DiscoveryConfig::default());
        let files = discovery.discover(&path);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 1);
    }
}
