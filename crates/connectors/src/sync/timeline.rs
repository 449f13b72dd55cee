//! Timeline scanner for skip/count listings
//!
//! Some providers only list resources newest-first with `skip` and `count`,
//! and accept a `since` date filter that is useless until a lower bound is
//! known. The [`Timeline`] cursor handles these in two phases:
//!
//! - **Backward scan** (not caught up): page through history by `skip` until
//!   a short page proves the beginning was reached. The first item seen is
//!   kept as the `start_at` anchor and becomes `oldest` once history is
//!   exhausted.
//! - **Forward stream** (caught up): list with `since = oldest_created_on`.
//!   Items newer than `oldest` are returned; when a page ends on `oldest` the
//!   pass is complete and the pass's first item becomes the new `oldest`.
//!
//! Pages are always returned oldest-first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// An item listed by a [`TimelineSource`]
pub trait TimelineItem {
    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

/// Query sent to a [`TimelineSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineQuery {
    pub skip: usize,
    pub count: usize,
    /// Only list items created at or after this instant
    pub since: Option<DateTime<Utc>>,
}

/// A provider listing resources newest-first
pub trait TimelineSource {
    type Item: TimelineItem;

    fn list(&self, query: &TimelineQuery) -> Result<Vec<Self::Item>>;
}

/// Persisted progress of a timeline scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    #[serde(default)]
    pub start_at_created_on: Option<DateTime<Utc>>,
    #[serde(rename = "startAtID", default)]
    pub start_at_id: Option<String>,
    #[serde(default)]
    pub oldest_created_on: Option<DateTime<Utc>>,
    #[serde(rename = "oldestID", default)]
    pub oldest_id: Option<String>,
    #[serde(default)]
    pub skip: usize,
}

/// One step of a timeline scan
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePage<T> {
    /// Items in chronological order
    pub items: Vec<T>,
    /// Cursor to persist once `items` are handled
    pub timeline: Timeline,
    pub has_more: bool,
}

impl Timeline {
    /// Whether the beginning of history has been found
    pub fn is_caught_up(&self) -> bool {
        self.oldest_created_on.is_some()
    }

    /// Fetch the next page
    ///
    /// The receiver is not modified; the returned [`TimelinePage`] carries
    /// the updated cursor so a failed call leaves nothing half-applied.
    ///
    /// # Arguments
    /// * `source` - Provider listing
    /// * `count` - Items per provider request
    pub fn next_page<S: TimelineSource>(
        &self,
        source: &S,
        count: usize,
    ) -> Result<TimelinePage<S::Item>> {
        if self.is_caught_up() {
            self.stream_forward(source, count)
        } else {
            self.scan_backward(source, count)
        }
    }

    fn scan_backward<S: TimelineSource>(
        &self,
        source: &S,
        count: usize,
    ) -> Result<TimelinePage<S::Item>> {
        let mut next = self.clone();
        let mut items = source.list(&TimelineQuery {
            skip: self.skip,
            count,
            since: None,
        })?;

        if self.skip == 0
            && let Some(first) = items.first()
        {
            next.set_start_at(first);
        }

        let has_more = if items.len() < count {
            next.skip = 0;
            if next.start_at_id.is_some() {
                next.oldest_created_on = next.start_at_created_on;
                next.oldest_id = next.start_at_id.clone();
                log::debug!(
                    "timeline reached beginning of history, oldest={:?}",
                    next.oldest_id
                );
            }
            false
        } else {
            next.skip += items.len();
            true
        };

        items.reverse();
        Ok(TimelinePage {
            items,
            timeline: next,
            has_more,
        })
    }

    fn stream_forward<S: TimelineSource>(
        &self,
        source: &S,
        count: usize,
    ) -> Result<TimelinePage<S::Item>> {
        let mut next = self.clone();
        let mut items = source.list(&TimelineQuery {
            skip: self.skip,
            count,
            since: self.oldest_created_on,
        })?;

        // The oldest item disappeared upstream: close the pass with what we have.
        // An empty first page (skip 0) means nothing new: the anchor stays and
        // has_more is false.
        if items.is_empty() {
            if self.skip > 0 {
                next.promote_start_at();
            }
            next.skip = 0;
            return Ok(TimelinePage {
                items,
                timeline: next,
                has_more: false,
            });
        }

        if self.skip == 0
            && let Some(first) = items.first()
        {
            next.set_start_at(first);
        }

        let oldest_id = self.oldest_id.as_deref();
        let ends_on_oldest = items.last().map(|item| item.id()) == oldest_id;

        // A page ending on `oldest` closes the forward pass. A lone `oldest`
        // means nothing new was created since the last pass.
        let has_more = if ends_on_oldest {
            items.pop();
            next.promote_start_at();
            next.skip = 0;
            if next.oldest_id != self.oldest_id {
                log::debug!("timeline caught up, new oldest={:?}", next.oldest_id);
            }
            !items.is_empty()
        } else {
            next.skip += items.len();
            true
        };

        items.reverse();
        Ok(TimelinePage {
            items,
            timeline: next,
            has_more,
        })
    }

    fn set_start_at<T: TimelineItem>(&mut self, item: &T) {
        self.start_at_created_on = Some(item.created_at());
        self.start_at_id = Some(item.id().to_string());
    }

    fn promote_start_at(&mut self) {
        if self.start_at_id.is_some() {
            self.oldest_created_on = self.start_at_created_on;
            self.oldest_id = self.start_at_id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        created_at: DateTime<Utc>,
    }

    impl TimelineItem for Item {
        fn id(&self) -> &str {
            &self.id
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }
    }

    /// Chronologically ordered backing list, served newest-first
    struct Source {
        items: RefCell<Vec<Item>>,
        queries: RefCell<Vec<TimelineQuery>>,
    }

    impl Source {
        fn with_items(n: usize) -> Self {
            let source = Self {
                items: RefCell::new(Vec::new()),
                queries: RefCell::new(Vec::new()),
            };
            for _ in 0..n {
                source.push();
            }
            source
        }

        fn push(&self) -> Item {
            let mut items = self.items.borrow_mut();
            let n = items.len();
            let item = Item {
                id: format!("tx-{}", n),
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::minutes(n as i64),
            };
            items.push(item.clone());
            item
        }
    }

    impl TimelineSource for Source {
        type Item = Item;

        fn list(&self, query: &TimelineQuery) -> Result<Vec<Item>> {
            self.queries.borrow_mut().push(query.clone());
            Ok(self
                .items
                .borrow()
                .iter()
                .rev()
                .filter(|item| query.since.is_none_or(|since| item.created_at >= since))
                .skip(query.skip)
                .take(query.count)
                .cloned()
                .collect())
        }
    }

    fn drain(source: &Source, timeline: &mut Timeline, count: usize) -> Vec<Item> {
        let mut seen = Vec::new();
        for _ in 0..1000 {
            let page = timeline.next_page(source, count).unwrap();
            seen.extend(page.items);
            *timeline = page.timeline;
            if !page.has_more {
                return seen;
            }
        }
        panic!("timeline did not settle");
    }

    #[test]
    fn test_backward_scan_returns_chronological_pages() {
        let source = Source::with_items(5);
        let page = Timeline::default().next_page(&source, 2).unwrap();

        let ids: Vec<_> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["tx-3", "tx-4"]);
        assert!(page.has_more);
        assert_eq!(page.timeline.skip, 2);
        assert_eq!(page.timeline.start_at_id.as_deref(), Some("tx-4"));
        assert!(!page.timeline.is_caught_up());
    }

    #[test]
    fn test_short_page_marks_beginning_of_history() {
        let source = Source::with_items(3);
        let page = Timeline::default().next_page(&source, 5).unwrap();

        assert!(!page.has_more);
        assert_eq!(page.items.len(), 3);
        assert!(page.timeline.is_caught_up());
        assert_eq!(page.timeline.oldest_id.as_deref(), Some("tx-2"));
        assert_eq!(page.timeline.skip, 0);
    }

    #[test]
    fn test_empty_history_stays_uncaught() {
        let source = Source::with_items(0);
        let page = Timeline::default().next_page(&source, 5).unwrap();

        assert!(page.items.is_empty());
        assert!(!page.has_more);
        assert!(!page.timeline.is_caught_up());
    }

    #[test]
    fn test_completeness_for_every_count() {
        for n in 1..=12 {
            for count in 1..=n {
                let source = Source::with_items(n);
                let mut timeline = Timeline::default();
                let seen = drain(&source, &mut timeline, count);

                assert!(timeline.is_caught_up(), "n={} count={}", n, count);
                assert_eq!(seen.len(), n, "n={} count={}", n, count);

                let mut chronological = seen.clone();
                chronological.sort_by_key(|item| item.created_at);
                assert_eq!(&chronological, &*source.items.borrow(), "n={} count={}", n, count);
            }
        }
    }

    #[test]
    fn test_liveness_after_catch_up() {
        let source = Source::with_items(7);
        let mut timeline = Timeline::default();
        drain(&source, &mut timeline, 3);

        let fresh = source.push();
        source.queries.borrow_mut().clear();
        let seen = drain(&source, &mut timeline, 3);

        assert_eq!(seen, vec![fresh.clone()]);
        assert_eq!(timeline.oldest_id.as_deref(), Some(fresh.id.as_str()));
        assert!(
            source
                .queries
                .borrow()
                .iter()
                .all(|q| q.since.is_some() && q.skip == 0)
        );
    }

    #[test]
    fn test_forward_stream_pages_through_a_burst() {
        let source = Source::with_items(4);
        let mut timeline = Timeline::default();
        drain(&source, &mut timeline, 2);

        let burst: Vec<_> = (0..5).map(|_| source.push()).collect();
        let seen = drain(&source, &mut timeline, 2);

        let mut seen_ids: Vec<_> = seen.iter().map(|i| i.id.clone()).collect();
        seen_ids.sort();
        let mut burst_ids: Vec<_> = burst.iter().map(|i| i.id.clone()).collect();
        burst_ids.sort();
        assert_eq!(seen_ids, burst_ids);
        assert_eq!(timeline.oldest_id.as_deref(), Some("tx-8"));

        // Nothing new: a single call confirms and stops.
        let page = timeline.next_page(&source, 2).unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.timeline, timeline);
    }

    #[test]
    fn test_errors_leave_cursor_untouched() {
        struct Failing;
        impl TimelineSource for Failing {
            type Item = Item;
            fn list(&self, _: &TimelineQuery) -> Result<Vec<Item>> {
                Err(crate::ConnectorError::Provider("unavailable".into()))
            }
        }

        let timeline = Timeline {
            skip: 4,
            ..Default::default()
        };
        assert!(timeline.next_page(&Failing, 2).is_err());
        assert_eq!(timeline.skip, 4);
    }
}
