//! Incremental synchronization
//!
//! - [`cursor`] encodes and decodes per-stream progress.
//! - [`pagination`] decides when a fetch loop has a full page.
//! - [`timeline`] scans skip/count listings in both directions.
//! - [`runner`] drains a stream page by page, persisting cursors.

pub mod cursor;
pub mod pagination;
pub mod runner;
pub mod timeline;

pub use cursor::{LastIdState, WatermarkState, decode_state, encode_state};
pub use pagination::{PageDecision, collect_pages, should_fetch_more};
pub use runner::{DrainOptions, DrainStats, EntityKind, FetchedItems, StreamKey, drain, fetch_page};
pub use timeline::{Timeline, TimelineItem, TimelinePage, TimelineQuery, TimelineSource};
