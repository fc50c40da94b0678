//! Scratch files for page images handed to file-path based model APIs.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{trace, warn};

/// A page image written to a temporary file, removed on drop.
///
/// Removal happens on every exit path, including early returns and panics
/// unwinding through the owner. A failed removal is logged and otherwise
/// ignored.
pub struct ScopedImageFile {
    path: PathBuf,
    guard: Option<TempPath>,
}

impl ScopedImageFile {
    /// Write `bytes` to a fresh temp file with the given extension.
    pub fn create(bytes: &[u8], extension: &str) -> std::io::Result<Self> {
        let suffix = format!(".{}", extension);
        let mut file = tempfile::Builder::new()
            .prefix("ocrflow-page-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        let guard = file.into_temp_path();
        let path = guard.to_path_buf();
        trace!("Created page image {}", path.display());

        Ok(Self {
            path,
            guard: Some(guard),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedImageFile {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            match guard.close() {
                Ok(()) => trace!("Removed page image {}", self.path.display()),
                Err(e) => warn!("Failed to remove page image {}: {}", self.path.display(), e),
            }
        }
    }
}
