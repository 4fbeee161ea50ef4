//! Transient preview files.
//!
//! A preview is a temporary copy of the document the operator can open in a
//! viewer. The handle owns the file; dropping the handle deletes it. The
//! store counts live handles so callers can check that at most one exists.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempPath;
use tracing::debug;
use uuid::Uuid;

use super::MediaType;

/// Creates preview handles and tracks how many are alive.
#[derive(Debug, Clone, Default)]
pub struct PreviewStore {
    dir: Option<PathBuf>,
    live: Arc<AtomicUsize>,
}

impl PreviewStore {
    /// Store writing into `dir`, or the system temp dir when `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of preview handles not yet released.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Write `content` to a fresh temporary file bound to `document_id`.
    pub fn create(
        &self,
        document_id: Uuid,
        media_type: MediaType,
        content: &[u8],
    ) -> io::Result<PreviewHandle> {
        let prefix = format!("cheque-preview-{}-", document_id.simple());
        let suffix = format!(".{}", media_type.extension());

        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(&suffix);
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(content)?;
        file.flush()?;

        let path = file.into_temp_path();
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(document_id = %document_id, path = %path.display(), live, "Preview created");

        Ok(PreviewHandle {
            document_id,
            path,
            live: Arc::clone(&self.live),
        })
    }
}

/// Owned preview file. Released (deleted) on drop.
#[derive(Debug)]
pub struct PreviewHandle {
    document_id: Uuid,
    path: TempPath,
    live: Arc<AtomicUsize>,
}

impl PreviewHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        let live = self.live.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!(document_id = %self.document_id, live, "Preview released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreviewStore::new(Some(dir.path().to_path_buf()));

        let handle = store.create(Uuid::new_v4(), MediaType::Png, b"\x89PNG").unwrap();
        let path = handle.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");
        assert!(path.to_string_lossy().ends_with(".png"));
        assert_eq!(store.live_count(), 1);

        drop(handle);
        assert!(!path.exists());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_clones_share_the_counter() {
        let store = PreviewStore::new(None);
        let other = store.clone();

        let handle = other.create(Uuid::new_v4(), MediaType::Pdf, b"%PDF-1.4").unwrap();
        assert_eq!(store.live_count(), 1);
        drop(handle);
        assert_eq!(store.live_count(), 0);
    }
}
