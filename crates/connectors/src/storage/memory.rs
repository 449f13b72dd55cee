//! In-memory cursor store, used in tests and one-shot runs

use std::collections::HashMap;
use std::sync::RwLock;

use super::CursorStore;
use crate::Result;
use crate::sync::StreamKey;

/// In-memory implementation of CursorStore
#[derive(Debug, Default)]
pub struct InMemoryCursorStore {
    cursors: RwLock<HashMap<StreamKey, Vec<u8>>>,
}

impl InMemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of streams with a stored cursor
    pub fn len(&self) -> usize {
        self.cursors.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CursorStore for InMemoryCursorStore {
    fn load(&self, stream: &StreamKey) -> Result<Option<Vec<u8>>> {
        let cursors = match self.cursors.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(cursors.get(stream).cloned())
    }

    fn save(&self, stream: &StreamKey, state: &[u8]) -> Result<()> {
        let mut cursors = match self.cursors.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cursors.insert(stream.clone(), state.to_vec());
        Ok(())
    }

    fn delete(&self, stream: &StreamKey) -> Result<()> {
        let mut cursors = match self.cursors.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cursors.remove(stream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::EntityKind;

    #[test]
    fn test_save_load_delete() {
        let store = InMemoryCursorStore::new();
        let stream = StreamKey::new("acme", EntityKind::Payments);

        assert_eq!(store.load(&stream).unwrap(), None);
        store.save(&stream, b"{\"skip\":3}").unwrap();
        assert_eq!(store.load(&stream).unwrap(), Some(b"{\"skip\":3}".to_vec()));
        assert_eq!(store.len(), 1);

        store.delete(&stream).unwrap();
        assert!(store.is_empty());
    }
}
