//! File-based cursor store
//!
//! Directory structure:
//! ```text
//! state/
//!   acme/
//!     payments.json
//!     balances.acc-1.json
//!     balances.acc%2E1.json
//! ```
//!
//! Connector names and parents are percent-encoded, with `.` escaped too,
//! so distinct streams never share a file.

use std::fs;
use std::path::{Path, PathBuf};

use super::CursorStore;
use crate::Result;
use crate::sync::StreamKey;

/// One file per stream under a root directory
pub struct FileCursorStore {
    root: PathBuf,
}

impl FileCursorStore {
    /// Create a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cursor_path(&self, stream: &StreamKey) -> PathBuf {
        let filename = match &stream.parent {
            Some(parent) => format!("{}.{}.json", stream.kind.as_str(), sanitize(parent)),
            None => format!("{}.json", stream.kind.as_str()),
        };
        self.root.join(sanitize(&stream.connector)).join(filename)
    }
}

/// Reversibly encode a name as a single path component
fn sanitize(name: &str) -> String {
    urlencoding::encode(name).replace('.', "%2E")
}

impl CursorStore for FileCursorStore {
    fn load(&self, stream: &StreamKey) -> Result<Option<Vec<u8>>> {
        let path = self.cursor_path(stream);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&path)?))
    }

    fn save(&self, stream: &StreamKey, state: &[u8]) -> Result<()> {
        let path = self.cursor_path(stream);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically (temp file, then rename)
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, state)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn delete(&self, stream: &StreamKey) -> Result<()> {
        let path = self.cursor_path(stream);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
