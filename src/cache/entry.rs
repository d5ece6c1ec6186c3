//! Per-key accumulated page state.

use super::listing::Window;
use crate::domain::{FetchError, Item, QueryKey};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Identity of one in-flight fetch.
///
/// A completion is only applied if its ticket is still the in-flight ticket
/// of the entry it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub id: u64,
    pub key: QueryKey,
    /// Entry cursor at the time the fetch was issued.
    pub cursor: usize,
}

/// Items, cursor and status accumulated for one [`QueryKey`].
///
/// `items` is append-only for the lifetime of the entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    key: QueryKey,
    items: Vec<Item>,
    ids: HashSet<u64>,
    cursor: usize,
    has_more: bool,
    fetched_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    released_at: Option<DateTime<Utc>>,
    subscribers: usize,
    in_flight: Option<FetchTicket>,
    error: Option<FetchError>,
}

impl CacheEntry {
    pub(crate) fn new(key: QueryKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            items: Vec::new(),
            ids: HashSet::new(),
            cursor: 0,
            has_more: true,
            fetched_at: None,
            created_at: now,
            released_at: None,
            subscribers: 0,
            in_flight: None,
            error: None,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether another page may exist. True until a fetch proves otherwise.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub const fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    #[must_use]
    pub const fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    #[must_use]
    pub const fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub const fn subscribers(&self) -> usize {
        self.subscribers
    }

    pub(crate) fn subscribe(&mut self) {
        self.subscribers += 1;
        self.released_at = None;
    }

    pub(crate) fn unsubscribe(&mut self, now: DateTime<Utc>) {
        self.subscribers = self.subscribers.saturating_sub(1);
        if self.subscribers == 0 {
            self.released_at = Some(now);
        }
    }

    /// When the entry last had no readers, or its creation time if it never
    /// had any.
    pub(crate) fn idle_since(&self) -> DateTime<Utc> {
        self.released_at.unwrap_or(self.created_at)
    }

    pub(crate) fn start_fetch(&mut self, id: u64) -> FetchTicket {
        let ticket = FetchTicket {
            id,
            key: self.key.clone(),
            cursor: self.cursor,
        };
        self.error = None;
        self.in_flight = Some(ticket.clone());
        ticket
    }

    /// Clears the in-flight marker if `ticket` owns it.
    pub(crate) fn finish_fetch(&mut self, ticket: &FetchTicket) -> bool {
        match &self.in_flight {
            Some(current) if current.id == ticket.id => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn fail(&mut self, error: FetchError) {
        self.error = Some(error);
    }

    /// Appends a window and advances the cursor.
    ///
    /// Returns the number of items appended. Items whose id is already
    /// present are skipped, which can only happen if the upstream result
    /// shifted between two page fetches.
    pub(crate) fn append(&mut self, window: Window, page_size: usize, now: DateTime<Utc>) -> usize {
        let offered = window.items.len();
        let before = self.items.len();
        for item in window.items {
            if self.ids.insert(item.id) {
                self.items.push(item);
            }
        }
        let appended = self.items.len() - before;
        let skipped = offered - appended;
        if skipped > 0 {
            tracing::warn!(key = %self.key, skipped, "upstream shifted between pages, duplicates dropped");
        }

        // a shrunken upstream must not pull the cursor back
        self.cursor = window.next_cursor.max(self.cursor);
        self.has_more = window.has_more;
        self.fetched_at = Some(now);
        self.error = None;

        debug_assert!(
            skipped > 0 || !self.has_more || self.items.len() % page_size == 0,
            "non-final page left a partial window"
        );

        appended
    }
}
