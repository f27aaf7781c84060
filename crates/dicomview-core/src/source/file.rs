//! Local file sources.

use std::fs::File;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::SourceError;

/// Open a local file for streaming, enforcing the size limit.
///
/// Returns the open file and its length in bytes.
pub fn open_file(path: &Path, limits: &LimitsConfig) -> Result<(File, u64), SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    let open_err = |source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(open_err)?;
    if metadata.is_dir() {
        return Err(open_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "is a directory",
        )));
    }

    let max_bytes = limits.max_file_size_mb.saturating_mul(1024 * 1024);
    if metadata.len() > max_bytes {
        return Err(SourceError::FileTooLarge {
            path: path.to_path_buf(),
            size_mb: metadata.len() / (1024 * 1024),
            max_mb: limits.max_file_size_mb,
        });
    }

    let file = File::open(path).map_err(open_err)?;
    tracing::debug!("Opened {:?} ({} bytes)", path, metadata.len());
    Ok((file, metadata.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing() {
        let err = open_file(Path::new("/nope/nothing.dcm"), &LimitsConfig::default()).unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn test_open_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_file(dir.path(), &LimitsConfig::default()).unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
    }

    #[test]
    fn test_open_respects_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.dcm");
        std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();

        let limits = LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        };
        let err = open_file(&path, &limits).unwrap_err();
        assert!(err.to_string().contains("File too large"));
    }
}
