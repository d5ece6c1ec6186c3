//! Keyed page cache with request coalescing and freshness tracking.

use super::entry::{CacheEntry, FetchTicket};
use super::listing::{prepare, window};
use crate::domain::{FetchError, Item, QueryKey};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::{debug, debug_span, warn};

pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Page size and lifetime rules for cached entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub page_size: usize,
    /// Age after which a subscribed-to entry is refetched from scratch.
    pub stale_after: Duration,
    /// How long an entry without subscribers survives a sweep.
    pub retain_for: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            stale_after: Duration::minutes(5),
            retain_for: Duration::minutes(10),
        }
    }
}

/// Result of asking the cache to fetch the next page for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStart {
    /// A new fetch must be issued for this ticket.
    Started(FetchTicket),
    /// A fetch for the key is already running; no new request is needed.
    Coalesced(FetchTicket),
    /// The key has no more pages.
    Exhausted,
}

/// Result of applying a fetch outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied { appended: usize, has_more: bool },
    Failed(FetchError),
    /// The ticket no longer owns its entry (reset, eviction, or a newer
    /// fetch). Nothing was changed.
    Discarded,
}

/// How a subscription found its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Fresh items are already cached.
    Warm,
    /// The entry is empty and needs its first page.
    Cold,
}

/// Entries keyed by the full filter tuple.
///
/// At most one fetch is in flight per key. Completions are matched
/// against the ticket stored on the entry, so a response that outlives
/// its entry or its key is dropped rather than merged.
#[derive(Debug, Default)]
pub struct PageCache {
    policy: CachePolicy,
    entries: HashMap<QueryKey, CacheEntry>,
    next_ticket: u64,
}

impl PageCache {
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
            next_ticket: 0,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    #[must_use]
    pub fn entry(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_in_flight(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(CacheEntry::is_fetching)
    }

    fn is_stale(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        entry
            .fetched_at()
            .is_some_and(|at| now - at > self.policy.stale_after)
    }

    /// Registers a reader for `key`.
    ///
    /// A stale entry with no fetch running is dropped and rebuilt empty, so
    /// the reader starts again from the first page.
    pub fn acquire(&mut self, key: &QueryKey, now: DateTime<Utc>) -> Binding {
        let _span = debug_span!("cache_acquire", key = %key).entered();

        let stale = self
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_fetching() && self.is_stale(entry, now));
        if stale {
            debug!("dropping stale entry");
            self.entries.remove(key);
        }

        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(key.clone(), now));
        entry.subscribe();

        if entry.items().is_empty() && entry.fetched_at().is_none() {
            Binding::Cold
        } else {
            debug!(items = entry.items().len(), "warm entry");
            Binding::Warm
        }
    }

    /// Drops a reader for `key`. Unknown keys are ignored.
    pub fn release(&mut self, key: &QueryKey, now: DateTime<Utc>) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.unsubscribe(now);
        }
    }

    /// Claims the next page fetch for `key`.
    pub fn begin_fetch(&mut self, key: &QueryKey, now: DateTime<Utc>) -> FetchStart {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(key.clone(), now));

        if let Some(ticket) = entry.in_flight() {
            debug!(key = %key, ticket = ticket.id, "coalesced onto in-flight fetch");
            return FetchStart::Coalesced(ticket.clone());
        }
        if !entry.has_more() {
            return FetchStart::Exhausted;
        }

        self.next_ticket += 1;
        let ticket = entry.start_fetch(self.next_ticket);
        debug!(key = %key, ticket = ticket.id, cursor = ticket.cursor, "fetch started");
        FetchStart::Started(ticket)
    }

    /// Applies a fetch outcome to the entry that issued `ticket`.
    ///
    /// On success the raw upstream result is sorted, filtered and windowed
    /// at the entry's cursor. On failure the cursor and items are left
    /// as they were and the error is recorded.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<Vec<Item>, FetchError>,
        now: DateTime<Utc>,
    ) -> Completion {
        let _span = debug_span!("cache_complete", key = %ticket.key, ticket = ticket.id).entered();

        let page_size = self.policy.page_size;
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            debug!("entry evicted, discarding response");
            return Completion::Discarded;
        };
        if !entry.finish_fetch(ticket) {
            debug!("ticket superseded, discarding response");
            return Completion::Discarded;
        }

        match outcome {
            Ok(raw) => {
                let listing = prepare(raw, &ticket.key);
                debug_assert_eq!(ticket.cursor, entry.cursor(), "cursor moved during fetch");
                let page = window(&listing, entry.cursor(), page_size);
                let appended = entry.append(page, page_size, now);
                debug!(appended, cursor = entry.cursor(), has_more = entry.has_more(), "page applied");
                Completion::Applied {
                    appended,
                    has_more: entry.has_more(),
                }
            }
            Err(error) => {
                warn!(error = %error, "fetch failed");
                entry.fail(error.clone());
                Completion::Failed(error)
            }
        }
    }

    /// Evicts idle entries.
    ///
    /// An entry is kept while it has readers or a fetch running. Otherwise
    /// it is evicted once stale, or once it has been idle for longer than
    /// the retention window. Returns the number of entries evicted.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let policy = self.policy;
        self.entries.retain(|_, entry| {
            if entry.subscribers() > 0 || entry.is_fetching() {
                return true;
            }
            let stale = entry
                .fetched_at()
                .is_some_and(|at| now - at > policy.stale_after);
            let expired = now - entry.idle_since() > policy.retain_for;
            !(stale || expired)
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "cache swept");
        }
        evicted
    }

    /// Drops every entry. Responses still in flight will be discarded.
    pub fn evict_all(&mut self) -> usize {
        let evicted = self.entries.len();
        self.entries.clear();
        debug!(evicted, "cache cleared");
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, RatingThreshold, SortOrder};

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    fn catalog(n: u64) -> Vec<Item> {
        (1..=n)
            .map(|i| Item::new(i, format!("Product {i}"), i as f64))
            .collect()
    }

    fn started(start: FetchStart) -> FetchTicket {
        match start {
            FetchStart::Started(ticket) => ticket,
            other => panic!("expected a started fetch, got {other:?}"),
        }
    }

    #[test]
    fn pages_through_fourteen_items() {
        let mut cache = PageCache::default();
        let key = QueryKey::default();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let ticket = started(cache.begin_fetch(&key, now()));
            cache.complete(&ticket, Ok(catalog(14)), now());
            let entry = cache.entry(&key).unwrap();
            seen.push((entry.items().len(), entry.cursor(), entry.has_more()));
        }

        assert_eq!(seen, vec![(6, 6, true), (12, 12, true), (14, 14, false)]);
        assert_eq!(cache.begin_fetch(&key, now()), FetchStart::Exhausted);
    }

    #[test]
    fn concurrent_requests_for_a_key_coalesce() {
        let mut cache = PageCache::default();
        let key = QueryKey::default();

        let first = started(cache.begin_fetch(&key, now()));
        assert_eq!(cache.begin_fetch(&key, now()), FetchStart::Coalesced(first.clone()));

        cache.complete(&first, Ok(catalog(14)), now());
        assert!(matches!(cache.begin_fetch(&key, now()), FetchStart::Started(_)));
    }

    #[test]
    fn failure_keeps_cursor_and_records_error() {
        let mut cache = PageCache::default();
        let key = QueryKey::default();

        let ticket = started(cache.begin_fetch(&key, now()));
        cache.complete(&ticket, Ok(catalog(14)), now());

        let ticket = started(cache.begin_fetch(&key, now()));
        let outcome = cache.complete(&ticket, Err(FetchError::Network("offline".to_string())), now());
        assert_eq!(outcome, Completion::Failed(FetchError::Network("offline".to_string())));

        let entry = cache.entry(&key).unwrap();
        assert_eq!((entry.items().len(), entry.cursor()), (6, 6));
        assert_eq!(entry.error(), Some(&FetchError::Network("offline".to_string())));

        // retrying clears the error and resumes from the same cursor
        let retry = started(cache.begin_fetch(&key, now()));
        assert_eq!(retry.cursor, 6);
        assert!(cache.entry(&key).unwrap().error().is_none());
    }

    #[test]
    fn evicted_entry_discards_late_response() {
        let mut cache = PageCache::default();
        let key = QueryKey::default();

        let ticket = started(cache.begin_fetch(&key, now()));
        cache.evict_all();

        assert_eq!(cache.complete(&ticket, Ok(catalog(14)), now()), Completion::Discarded);
        assert!(!cache.contains(&key));
    }

    #[test]
    fn response_lands_only_in_its_own_key() {
        let mut cache = PageCache::default();
        let all = QueryKey::default();
        let jewelery = QueryKey {
            category: Category::parse("jewelery"),
            ..QueryKey::default()
        };

        let slow = started(cache.begin_fetch(&all, now()));
        let fast = started(cache.begin_fetch(&jewelery, now()));

        cache.complete(&fast, Ok(catalog(3)), now());
        cache.complete(&slow, Ok(catalog(14)), now());

        assert_eq!(cache.entry(&jewelery).unwrap().items().len(), 3);
        assert_eq!(cache.entry(&all).unwrap().items().len(), 6);
    }

    #[test]
    fn filters_apply_before_windowing() {
        let mut cache = PageCache::default();
        let key = QueryKey {
            sort_order: SortOrder::Desc,
            search_text: "product 1".to_string(),
            rating_threshold: RatingThreshold::default(),
            ..QueryKey::default()
        };

        let ticket = started(cache.begin_fetch(&key, now()));
        cache.complete(&ticket, Ok(catalog(14)), now());

        // Product 1, 10..14 match; highest price first
        let ids: Vec<u64> = cache.entry(&key).unwrap().items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![14, 13, 12, 11, 10, 1]);
        assert!(!cache.entry(&key).unwrap().has_more());
    }

    #[test]
    fn stale_entry_is_rebuilt_on_acquire() {
        let mut cache = PageCache::default();
        let key = QueryKey::default();
        assert_eq!(cache.acquire(&key, now()), Binding::Cold);

        let ticket = started(cache.begin_fetch(&key, now()));
        cache.complete(&ticket, Ok(catalog(14)), now());
        cache.release(&key, now());

        assert_eq!(cache.acquire(&key, now() + Duration::minutes(1)), Binding::Warm);
        cache.release(&key, now() + Duration::minutes(1));

        assert_eq!(cache.acquire(&key, now() + Duration::minutes(6)), Binding::Cold);
        assert!(cache.entry(&key).unwrap().items().is_empty());
    }

    #[test]
    fn sweep_keeps_subscribed_and_in_flight_entries() {
        let mut cache = PageCache::default();
        let watched = QueryKey::default();
        let loading = QueryKey {
            category: Category::parse("electronics"),
            ..QueryKey::default()
        };
        let idle = QueryKey {
            category: Category::parse("jewelery"),
            ..QueryKey::default()
        };

        cache.acquire(&watched, now());
        let ticket = started(cache.begin_fetch(&watched, now()));
        cache.complete(&ticket, Ok(catalog(14)), now());
        cache.begin_fetch(&loading, now());
        cache.acquire(&idle, now());
        cache.release(&idle, now());

        let later = now() + Duration::minutes(11);
        assert_eq!(cache.sweep(later), 1);
        assert!(cache.contains(&watched));
        assert!(cache.contains(&loading));
        assert!(!cache.contains(&idle));
    }

    #[test]
    fn sweep_respects_retention_window() {
        let mut cache = PageCache::default();
        let key = QueryKey::default();
        cache.acquire(&key, now());
        cache.release(&key, now());

        assert_eq!(cache.sweep(now() + Duration::minutes(9)), 0);
        assert_eq!(cache.sweep(now() + Duration::minutes(11)), 1);
    }
}
