//! Read-only view of the active result list for the rendering layer.

use crate::cache::CacheEntry;
use crate::domain::{FetchError, FilterState, Item};
use std::fmt;

/// Why an idle, error-free list has nothing to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    /// A search is active and no rating filter narrows it further.
    NoSearchMatches { query: String },
    /// The rating filter excluded everything.
    NoRatingMatches { threshold: u8 },
    /// The category itself is empty.
    NoProducts,
}

impl EmptyState {
    fn classify(filters: &FilterState) -> Self {
        if filters.rating_threshold.is_active() {
            Self::NoRatingMatches {
                threshold: filters.rating_threshold.get(),
            }
        } else if filters.search_text.is_empty() {
            Self::NoProducts
        } else {
            Self::NoSearchMatches {
                query: filters.search_text.clone(),
            }
        }
    }
}

impl fmt::Display for EmptyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSearchMatches { query } => {
                write!(f, "No products match your search. \u{201c}{query}\u{201d}")
            }
            Self::NoRatingMatches { .. } => f.write_str("No products with this rating."),
            Self::NoProducts => f.write_str("No products to view."),
        }
    }
}

/// Snapshot of the active cache entry.
///
/// Borrowed from the engine, so it reflects the entry as of the last event
/// and cannot outlive the next mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseView<'a> {
    pub items: &'a [Item],
    pub is_loading_first_page: bool,
    pub is_loading_next_page: bool,
    pub has_more: bool,
    pub error: Option<&'a FetchError>,
    pub empty_state: Option<EmptyState>,
}

impl<'a> BrowseView<'a> {
    pub(crate) fn of(entry: Option<&'a CacheEntry>, filters: &FilterState) -> Self {
        let Some(entry) = entry else {
            return Self {
                items: &[],
                is_loading_first_page: false,
                is_loading_next_page: false,
                has_more: true,
                error: None,
                empty_state: None,
            };
        };

        let items = entry.items();
        let fetching = entry.is_fetching();
        let settled_empty =
            items.is_empty() && !fetching && entry.error().is_none() && entry.fetched_at().is_some();

        Self {
            items,
            is_loading_first_page: fetching && items.is_empty(),
            is_loading_next_page: fetching && !items.is_empty(),
            has_more: entry.has_more(),
            error: entry.error(),
            empty_state: settled_empty.then(|| EmptyState::classify(filters)),
        }
    }
}
