use crate::Result;
use crate::sync::StreamKey;

/// Storage for per-stream cursors
///
/// Writes are last-writer-wins. Callers must run at most one fetch per
/// stream at a time.
pub trait CursorStore: Send + Sync {
    /// Load the cursor of a stream, `None` if it never ran
    fn load(&self, stream: &StreamKey) -> Result<Option<Vec<u8>>>;

    /// Replace the cursor of a stream
    fn save(&self, stream: &StreamKey, state: &[u8]) -> Result<()>;

    /// Forget a stream's progress
    fn delete(&self, stream: &StreamKey) -> Result<()>;
}
