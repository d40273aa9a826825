//! Transient on-disk copies of submitted documents.
//!
//! An [`UploadedDocument`] owns a uniquely named `*.pdf` file and deletes it
//! when dropped, whatever path the request took (success, error, panic
//! unwinding). Deleting a file that is already gone is not an error.

use crate::error::ExtractError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A document written to a temporary file for the conversion engine.
#[derive(Debug)]
pub struct UploadedDocument {
    path: PathBuf,
    original_name: Option<String>,
    len: usize,
}

impl UploadedDocument {
    /// Write `bytes` to a fresh `upload-*.pdf` file in `dir` (or the system
    /// temp dir).
    pub fn persist(
        bytes: &[u8],
        original_name: Option<String>,
        dir: Option<&Path>,
    ) -> Result<Self, ExtractError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(".pdf");
        let mut tmp = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|source| ExtractError::TempFile { source })?;

        tmp.write_all(bytes)
            .and_then(|_| tmp.flush())
            .map_err(|source| ExtractError::TempFile { source })?;

        // From here on deletion is ours, not tempfile's.
        let path = tmp
            .into_temp_path()
            .keep()
            .map_err(|e| ExtractError::TempFile { source: e.error })?;

        debug!(
            "Persisted {} bytes ({}) to {}",
            bytes.len(),
            original_name.as_deref().unwrap_or("unnamed"),
            path.display()
        );
        Ok(Self {
            path,
            original_name,
            len: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name the client supplied, if any.
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for UploadedDocument {
    fn drop(&mut self) {
        remove_quietly(&self.path);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} already removed", path.display())
        }
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_file_has_content_and_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let upload =
            UploadedDocument::persist(b"%PDF-1.7 body", Some("a.pdf".into()), Some(dir.path()))
                .unwrap();
        let path = upload.path().to_path_buf();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 body");
        assert_eq!(upload.original_name(), Some("a.pdf"));
        assert_eq!(upload.len(), 13);

        drop(upload);
        assert!(!path.exists());
    }

    #[test]
    fn already_deleted_file_is_fine() {
        let upload = UploadedDocument::persist(b"x", None, None).unwrap();
        std::fs::remove_file(upload.path()).unwrap();
        drop(upload);
    }

    #[test]
    fn names_are_unique() {
        let a = UploadedDocument::persist(b"a", None, None).unwrap();
        let b = UploadedDocument::persist(b"b", None, None).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn missing_directory_is_temp_file_error() {
        let err = UploadedDocument::persist(b"x", None, Some(Path::new("/nonexistent/dir")))
            .unwrap_err();
        assert!(matches!(err, ExtractError::TempFile { .. }));
    }
}
