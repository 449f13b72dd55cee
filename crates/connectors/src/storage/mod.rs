//! Cursor persistence
//!
//! The engine itself keeps no state between calls. Whoever schedules fetches
//! persists the returned cursors through a [`CursorStore`], one entry per
//! stream.

mod file;
mod memory;
mod traits;

pub use file::FileCursorStore;
pub use memory::InMemoryCursorStore;
pub use traits::CursorStore;
