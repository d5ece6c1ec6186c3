//! Filter state store: the single source of truth for the active filters.
//!
//! Every mutation goes through one of the setters, each of which touches
//! exactly one field (or, for [`FilterStore::reset`], all fields in one
//! step) and returns a [`FilterChange`]. The caller hands that change to
//! [`notify_observers`] together with the two observers that must see every
//! transition: the URL synchronizer and the cache key resolver. Observers
//! receive the same snapshot, so neither can act on a stale read of the
//! other.

use crate::app::Action;
use crate::domain::{Category, FilterState, RatingThreshold, SortOrder};

/// One observable transition of the filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChange {
    pub previous: FilterState,
    pub current: FilterState,
    /// Set when the transition came from [`FilterStore::reset`].
    pub is_reset: bool,
}

impl FilterChange {
    /// True when the setter stored the value that was already there.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.previous == self.current
    }

    /// True when the derived cache key differs between the two states.
    #[must_use]
    pub fn key_changed(&self) -> bool {
        self.previous.query_key() != self.current.query_key()
    }
}

/// Receiver of filter transitions.
///
/// Implementations push the side effects they need onto `actions`; they must
/// not mutate the filter state themselves.
pub trait FilterObserver {
    fn filters_changed(&mut self, change: &FilterChange, actions: &mut Vec<Action>);
}

/// Delivers `change` to each observer in order.
pub fn notify_observers(
    change: &FilterChange,
    observers: &mut [&mut dyn FilterObserver],
    actions: &mut Vec<Action>,
) {
    let _span = tracing::debug_span!(
        "filters_changed",
        observers = observers.len(),
        noop = change.is_noop(),
        reset = change.is_reset
    )
    .entered();

    for observer in observers.iter_mut() {
        observer.filters_changed(change, actions);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterStore {
    state: FilterState,
}

impl FilterStore {
    /// Read-only snapshot of the current filters.
    #[must_use]
    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn set_category(&mut self, category: Category) -> FilterChange {
        tracing::debug!(category = %category, "set category");
        self.update(|state| state.category = category)
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) -> FilterChange {
        tracing::debug!(sort_order = %sort_order, "set sort order");
        self.update(|state| state.sort_order = sort_order)
    }

    pub fn set_search_text(&mut self, search_text: impl Into<String>) -> FilterChange {
        let search_text = search_text.into();
        tracing::debug!(search_len = search_text.len(), "set search text");
        self.update(|state| state.search_text = search_text)
    }

    pub fn set_rating_threshold(&mut self, threshold: RatingThreshold) -> FilterChange {
        tracing::debug!(rating = threshold.get(), "set rating threshold");
        self.update(|state| state.rating_threshold = threshold)
    }

    /// Restores every field to its default as a single transition.
    pub fn reset(&mut self) -> FilterChange {
        tracing::debug!("reset filters");
        let previous = std::mem::take(&mut self.state);
        FilterChange {
            previous,
            current: self.state.clone(),
            is_reset: true,
        }
    }

    /// Replaces the whole state, as when restoring from the address bar.
    pub fn replace(&mut self, state: FilterState) -> FilterChange {
        self.update(|current| *current = state)
    }

    fn update(&mut self, mutate: impl FnOnce(&mut FilterState)) -> FilterChange {
        let previous = self.state.clone();
        mutate(&mut self.state);
        FilterChange {
            previous,
            current: self.state.clone(),
            is_reset: false,
        }
    }
}
