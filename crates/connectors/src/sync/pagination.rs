//! Page-completion decisions for fetch loops
//!
//! A single `fetch_next_*` call may issue several provider requests. After
//! each one the loop asks [`should_fetch_more`] whether the window is full
//! and whether more data probably sits past its edge.
//!
//! When the window fills exactly on a maximal provider page, `has_more` is
//! reported even if nothing follows. The next call then costs one extra empty
//! page. That imprecision is accepted: the alternative is an extra request on
//! every full page.

use crate::Result;

/// Outcome of one page-completion check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDecision {
    /// The accumulated window is not full yet
    pub need_more: bool,
    /// More data probably exists beyond the window
    pub has_more: bool,
}

/// Decide whether to keep fetching
///
/// # Arguments
/// * `total` - Items accumulated so far in this invocation
/// * `last_batch` - Items returned by the most recent provider call
/// * `page_size` - Requested window size, greater than zero
pub fn should_fetch_more<T, U>(total: &[T], last_batch: &[U], page_size: usize) -> PageDecision {
    PageDecision::from_lengths(total.len(), last_batch.len(), page_size)
}

impl PageDecision {
    /// Same rule as [`should_fetch_more`], on lengths only
    pub fn from_lengths(total: usize, last_batch: usize, page_size: usize) -> Self {
        Self {
            need_more: total < page_size,
            has_more: total >= page_size && last_batch == page_size,
        }
    }
}

/// Drive a page-numbered provider listing until the window is full
///
/// `fetch_page` receives the zero-based page number and returns at most
/// `page_size` raw items. `map` turns each raw item into an output item, or
/// skips it by returning `None` (already ingested, unsupported asset...).
/// Requests are issued strictly one after another and stop once the window
/// is full or the provider returns a short page.
///
/// Returns the collected items, capped at `page_size`, and the `has_more`
/// flag of the final decision.
pub fn collect_pages<R, T, F, M>(
    page_size: usize,
    mut fetch_page: F,
    mut map: M,
) -> Result<(Vec<T>, bool)>
where
    F: FnMut(usize) -> Result<Vec<R>>,
    M: FnMut(R) -> Result<Option<T>>,
{
    let mut total = Vec::with_capacity(page_size);
    let mut page = 0;

    loop {
        let batch = fetch_page(page)?;
        let batch_len = batch.len();

        for raw in batch {
            if total.len() >= page_size {
                break;
            }
            if let Some(item) = map(raw)? {
                total.push(item);
            }
        }

        let decision = PageDecision::from_lengths(total.len(), batch_len, page_size);
        log::debug!(
            "page {} returned {} items, window {}/{} (need_more={}, has_more={})",
            page,
            batch_len,
            total.len(),
            page_size,
            decision.need_more,
            decision.has_more
        );

        if !decision.need_more || batch_len < page_size {
            return Ok((total, decision.has_more));
        }
        page += 1;
    }
}
