//! Secure plaintext scratch files
//!
//! Decrypted secrets briefly exist on disk while an operator edits them.
//! A scratch file is created with owner-only permissions and destroyed on
//! every exit path by a best-effort secure delete: overwrite with zeros,
//! then unlink.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{TallyError, TallyResult};

/// An owner-only temporary file that is shredded on drop
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Create a scratch file holding the given plaintext
    pub fn with_contents(contents: &[u8]) -> TallyResult<Self> {
        let temp = tempfile::Builder::new()
            .prefix("tally-secrets-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| TallyError::Io(format!("Failed to create scratch file: {}", e)))?;

        let (mut file, temp_path) = temp.into_parts();
        file.write_all(contents)
            .map_err(|e| TallyError::Io(format!("Failed to write scratch file: {}", e)))?;
        file.sync_all()
            .map_err(|e| TallyError::Io(format!("Failed to sync scratch file: {}", e)))?;
        drop(file);

        // Detach from tempfile's delete-on-drop; shredding is ours now
        let path = temp_path
            .keep()
            .map_err(|e| TallyError::Io(format!("Failed to keep scratch file: {}", e)))?;

        Ok(Self { path })
    }

    /// Path to hand to the editor subprocess
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the scratch file back after editing
    pub fn read_to_string(&self) -> TallyResult<String> {
        fs::read_to_string(&self.path).map_err(|e| {
            TallyError::Io(format!(
                "Failed to read scratch file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        shred(&self.path);
    }
}

/// Best-effort secure delete: overwrite with zeros, sync, unlink
///
/// Errors are ignored; the file must still be unlinked even when the
/// overwrite fails.
fn shred(path: &Path) {
    if let Ok(metadata) = fs::metadata(path) {
        if let Ok(mut file) = OpenOptions::new().write(true).open(path) {
            let zeros = vec![0u8; metadata.len() as usize];
            let _ = file.write_all(&zeros);
            let _ = file.sync_all();
        }
    }
    let _ = fs::remove_file(path);
}
