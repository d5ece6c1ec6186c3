//! Reset coordinator.
//!
//! A reset runs as one synchronous step, in this order:
//!
//! 1. cancel any pending search debounce
//! 2. restore default filters (one transition)
//! 3. clear the address bar query string
//! 4. evict every cache entry, which orphans every in-flight ticket
//! 5. bind the default key and fetch its first page cold
//!
//! Steps 3 to 5 are the two filter observers reacting to the reset
//! transition, so the address bar and filter state have settled before the
//! eviction happens. No await point separates the steps, so a consumer
//! never sees a partial reset.

use super::actions::Action;
use super::state::BrowseEngine;

impl BrowseEngine {
    pub(crate) fn reset(&mut self, actions: &mut Vec<Action>) {
        let _span = tracing::debug_span!("reset", entries = self.cache.len()).entered();

        self.search.cancel();
        let change = self.filters.reset();
        self.apply(&change, actions);

        tracing::debug!(actions = actions.len(), "reset complete");
    }
}
