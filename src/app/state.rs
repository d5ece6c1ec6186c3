//! The browse engine: filter store, address bar, and page cache wired
//! together.
//!
//! [`BrowseEngine`] owns every piece of mutable browse state. It is a plain
//! state machine: [`handle_event`](crate::app::handle_event) feeds it events
//! and collects [`Action`]s, and nothing in here waits on a timer or a
//! fetch.
//!
//! # Key Binding
//!
//! At any time the engine is bound to one [`QueryKey`], the key derived from
//! the current filters. Binding subscribes to that key's cache entry and, if
//! the entry is cold, starts its first page. Rebinding releases the previous
//! entry, which stays warm in the cache until the sweep retires it.
//!
//! Filter transitions reach the binding through `KeyResolver`, the second
//! observer after the URL synchronizer, so the address bar is always written
//! before any cache effect of the same transition.

use super::actions::Action;
use super::sentinel::Sentinel;
use super::view::BrowseView;
use crate::cache::{Binding, CachePolicy, Clock, Completion, FetchStart, PageCache, SystemClock};
use crate::domain::{FilterState, QueryKey};
use crate::filters::{notify_observers, Debouncer, FilterChange, FilterObserver, FilterStore, UrlSynchronizer};
use crate::source::{FetchRequest, FetchResponse};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub struct BrowseEngine {
    pub(crate) filters: FilterStore,
    pub(crate) url: UrlSynchronizer,
    pub(crate) search: Debouncer,
    pub(crate) cache: PageCache,
    pub(crate) sentinel: Sentinel,
    /// Key whose entry this engine is subscribed to.
    pub(crate) bound: Option<QueryKey>,
    clock: Box<dyn Clock>,
}

impl BrowseEngine {
    /// Creates an unbound engine with default filters.
    ///
    /// # Parameters
    ///
    /// * `policy` - Page size and cache lifetimes
    /// * `debounce` - Delay between the last search keystroke and propagation
    #[must_use]
    pub fn new(policy: CachePolicy, debounce: Duration) -> Self {
        Self {
            filters: FilterStore::default(),
            url: UrlSynchronizer::default(),
            search: Debouncer::new(debounce),
            cache: PageCache::new(policy),
            sentinel: Sentinel::default(),
            bound: None,
            clock: Box::new(SystemClock),
        }
    }

    /// Replaces the wall clock, typically with a [`ManualClock`](crate::cache::ManualClock).
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        self.filters.state()
    }

    /// Text currently in the search box, which may be ahead of the settled
    /// `search_text` filter while the debounce is pending.
    #[must_use]
    pub fn search_input(&self) -> &str {
        self.search
            .latest()
            .unwrap_or(self.filters.state().search_text.as_str())
    }

    #[must_use]
    pub const fn bound_key(&self) -> Option<&QueryKey> {
        self.bound.as_ref()
    }

    #[must_use]
    pub const fn cache(&self) -> &PageCache {
        &self.cache
    }

    #[must_use]
    pub const fn sentinel(&self) -> &Sentinel {
        &self.sentinel
    }

    /// The active result list.
    #[must_use]
    pub fn view(&self) -> BrowseView<'_> {
        let entry = self.bound.as_ref().and_then(|key| self.cache.entry(key));
        BrowseView::of(entry, self.filters.state())
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Restores filters from the address bar and binds their key.
    pub(crate) fn open(&mut self, query: &str, actions: &mut Vec<Action>) {
        let (state, page_entry) = self.url.open(query);
        actions.push(page_entry);
        self.search.cancel();
        self.filters.replace(state);

        let now = self.now();
        let key = self.filters.state().query_key();
        bind_key(&mut self.cache, &mut self.bound, key, now, actions);
    }

    /// Delivers a filter transition to the URL synchronizer, then to the key
    /// resolver.
    pub(crate) fn apply(&mut self, change: &FilterChange, actions: &mut Vec<Action>) {
        let mut resolver = KeyResolver {
            cache: &mut self.cache,
            bound: &mut self.bound,
            now: self.clock.now(),
        };
        notify_observers(change, &mut [&mut self.url, &mut resolver], actions);
    }

    /// Requests the next page of the bound key.
    ///
    /// Returns `true` if a fetch was started. Nothing happens when the key is
    /// exhausted or a fetch for it is already running.
    pub(crate) fn request_next_page(&mut self, actions: &mut Vec<Action>) -> bool {
        let Some(key) = self.bound.clone() else {
            debug!("next page requested before a key was bound");
            return false;
        };
        let now = self.now();
        start_fetch(&mut self.cache, &key, now, actions)
    }

    /// Refetches the page that last failed for the bound key.
    pub(crate) fn retry(&mut self, actions: &mut Vec<Action>) -> bool {
        let failed = self
            .bound
            .as_ref()
            .and_then(|key| self.cache.entry(key))
            .is_some_and(|entry| entry.error().is_some());
        if !failed {
            debug!("retry ignored, no failed fetch");
            return false;
        }
        self.request_next_page(actions)
    }

    /// Applies a fetch response. Returns `true` if the bound view changed.
    ///
    /// If the page landed on the bound key while the sentinel is still in
    /// the viewport and more pages exist, the next page is requested right
    /// away: the sentinel will not report another edge until it leaves.
    pub(crate) fn complete(&mut self, response: &FetchResponse, actions: &mut Vec<Action>) -> bool {
        let now = self.now();
        let completion = self
            .cache
            .complete(&response.ticket, response.outcome.clone(), now);
        let visible = self.bound.as_ref() == Some(&response.ticket.key);
        debug!(?completion, visible, attempts = response.attempts, "fetch completed");

        let more = matches!(completion, Completion::Applied { has_more: true, .. });
        if visible && more && self.sentinel.is_visible() {
            debug!("sentinel still in viewport, continuing");
            self.request_next_page(actions);
        }
        visible && completion != Completion::Discarded
    }

    pub(crate) fn sweep(&mut self) -> usize {
        let now = self.now();
        self.cache.sweep(now)
    }
}

impl fmt::Debug for BrowseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowseEngine")
            .field("filters", self.filters.state())
            .field("bound", &self.bound)
            .field("search", self.search.state())
            .field("entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Filter observer that moves the cache binding to the new key.
///
/// A reset transition evicts every entry before rebinding, so the default
/// key is always fetched cold afterwards.
struct KeyResolver<'a> {
    cache: &'a mut PageCache,
    bound: &'a mut Option<QueryKey>,
    now: DateTime<Utc>,
}

impl FilterObserver for KeyResolver<'_> {
    fn filters_changed(&mut self, change: &FilterChange, actions: &mut Vec<Action>) {
        if change.is_reset {
            self.cache.evict_all();
            *self.bound = None;
        } else if !change.key_changed() && self.bound.is_some() {
            return;
        }
        bind_key(self.cache, self.bound, change.current.query_key(), self.now, actions);
    }
}

fn bind_key(
    cache: &mut PageCache,
    bound: &mut Option<QueryKey>,
    key: QueryKey,
    now: DateTime<Utc>,
    actions: &mut Vec<Action>,
) {
    if bound.as_ref() == Some(&key) {
        return;
    }
    debug!(key = %key, "binding key");
    if let Some(previous) = bound.replace(key.clone()) {
        cache.release(&previous, now);
    }
    if cache.acquire(&key, now) == Binding::Cold {
        start_fetch(cache, &key, now, actions);
    }
    cache.sweep(now);
}

fn start_fetch(cache: &mut PageCache, key: &QueryKey, now: DateTime<Utc>, actions: &mut Vec<Action>) -> bool {
    match cache.begin_fetch(key, now) {
        FetchStart::Started(ticket) => {
            actions.push(Action::Fetch(FetchRequest::for_ticket(ticket)));
            true
        }
        FetchStart::Coalesced(_) | FetchStart::Exhausted => false,
    }
}
