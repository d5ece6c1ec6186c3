//! Client-side listing: sort, filter, and window a full upstream result.
//!
//! The upstream returns every item for a category in one response. Order
//! of operations matters for stable page boundaries:
//!
//! 1. sort the full raw set by price (once per raw fetch)
//! 2. apply the free-text and rating predicates to the full sorted set
//! 3. slice `cursor..cursor + page_size`
//!
//! Filtering after windowing would make page `n` depend on how many items
//! pages `0..n` happened to drop.

use crate::domain::{Item, QueryKey, SortOrder};

/// One page cut from a prepared listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub items: Vec<Item>,
    /// Cursor for the following page, clamped to the listing length.
    pub next_cursor: usize,
    pub has_more: bool,
}

/// Stable price sort; ties keep upstream order.
pub fn sort_by_price(items: &mut [Item], order: SortOrder) {
    match order {
        SortOrder::Asc => items.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortOrder::Desc => items.sort_by(|a, b| b.price.total_cmp(&a.price)),
    }
}

/// Whether `item` passes the client-side predicates of `key`.
///
/// Category is not checked here; it is applied by the upstream.
#[must_use]
pub fn matches(item: &Item, key: &QueryKey) -> bool {
    let threshold = key.rating_threshold;
    if threshold.is_active() && item.whole_stars() != i64::from(threshold.get()) {
        return false;
    }
    if key.search_text.is_empty() {
        return true;
    }
    item.title
        .to_lowercase()
        .contains(&key.search_text.to_lowercase())
}

/// Sorts then filters a raw upstream result for `key`.
#[must_use]
pub fn prepare(mut raw: Vec<Item>, key: &QueryKey) -> Vec<Item> {
    sort_by_price(&mut raw, key.sort_order);
    raw.retain(|item| matches(item, key));
    raw
}

/// Cuts the page starting at `cursor`.
///
/// A cursor past the end yields an empty, final window.
#[must_use]
pub fn window(listing: &[Item], cursor: usize, page_size: usize) -> Window {
    let start = cursor.min(listing.len());
    let end = cursor.saturating_add(page_size).min(listing.len());
    Window {
        items: listing[start..end].to_vec(),
        next_cursor: end,
        has_more: listing.len() > cursor.saturating_add(page_size),
    }
}
