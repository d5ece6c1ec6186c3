//! Address-bar synchronization for the filter state.
//!
//! The query-string schema is:
//!
//! | parameter  | field              | default |
//! |------------|--------------------|---------|
//! | `category` | `category`         | `all`   |
//! | `sort`     | `sort_order`       | `asc`   |
//! | `search`   | `search_text`      | empty   |
//! | `rating`   | `rating_threshold` | `0`     |
//!
//! A field equal to its default is omitted, so the default state encodes to
//! the empty string. Decoding is forgiving field by field: a malformed
//! `rating` falls back to `0` without disturbing a valid `category` next to
//! it. Parameters outside the schema are carried along on filter changes
//! and dropped by a reset, which leaves the query string empty.

use crate::app::Action;
use crate::domain::{Category, FilterState, RatingThreshold, SortOrder};
use crate::filters::store::{FilterChange, FilterObserver};
use url::form_urlencoded;

const CATEGORY: &str = "category";
const SORT: &str = "sort";
const SEARCH: &str = "search";
const RATING: &str = "rating";

const FILTER_PARAMS: [&str; 4] = [CATEGORY, SORT, SEARCH, RATING];

/// Navigation-history semantics for an address-bar write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// Overwrite the current history entry.
    Replace,
    /// Add a new history entry.
    Push,
}

/// Read/write access to the host's address bar query string.
pub trait AddressBar {
    /// Current query string, with or without a leading `?`.
    fn query_string(&self) -> String;

    fn set_query_string(&mut self, query: &str, mode: HistoryMode);
}

/// In-memory address bar that records every write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryAddressBar {
    current: String,
    history: Vec<(String, HistoryMode)>,
}

impl MemoryAddressBar {
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: initial.into(),
            history: Vec::new(),
        }
    }

    /// Every write so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> &[(String, HistoryMode)] {
        &self.history
    }

    /// Number of history entries pushed, including the initial page entry.
    #[must_use]
    pub fn pushes(&self) -> usize {
        self.history
            .iter()
            .filter(|(_, mode)| *mode == HistoryMode::Push)
            .count()
    }
}

impl AddressBar for MemoryAddressBar {
    fn query_string(&self) -> String {
        self.current.clone()
    }

    fn set_query_string(&mut self, query: &str, mode: HistoryMode) {
        self.current = query.to_string();
        self.history.push((self.current.clone(), mode));
    }
}

/// Encodes a filter state, omitting default fields.
///
/// ```
/// use storefront::domain::{Category, FilterState, SortOrder};
/// use storefront::filters::url::to_query_string;
///
/// assert_eq!(to_query_string(&FilterState::default()), "");
///
/// let state = FilterState {
///     category: Category::parse("men's clothing"),
///     sort_order: SortOrder::Desc,
///     ..FilterState::default()
/// };
/// assert_eq!(to_query_string(&state), "category=men%27s+clothing&sort=desc");
/// ```
#[must_use]
pub fn to_query_string(state: &FilterState) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    append_filter_pairs(&mut serializer, state);
    serializer.finish()
}

/// Decodes a query string into a filter state.
///
/// Absent or malformed fields resolve to their defaults independently.
#[must_use]
pub fn from_query_string(query: &str) -> FilterState {
    let mut state = FilterState::default();
    let mut seen = [false; FILTER_PARAMS.len()];

    for (name, value) in parse_pairs(query) {
        let Some(slot) = FILTER_PARAMS.iter().position(|param| *param == name) else {
            continue;
        };
        // first occurrence wins
        if std::mem::replace(&mut seen[slot], true) {
            continue;
        }

        match FILTER_PARAMS[slot] {
            CATEGORY => state.category = Category::parse(&value),
            SORT => match SortOrder::parse(&value) {
                Some(sort_order) => state.sort_order = sort_order,
                None => tracing::warn!(value = %value, "ignoring invalid sort parameter"),
            },
            SEARCH => state.search_text = value,
            RATING => match value.parse::<u8>().ok().and_then(|v| RatingThreshold::new(v).ok()) {
                Some(threshold) => state.rating_threshold = threshold,
                None => tracing::warn!(value = %value, "ignoring invalid rating parameter"),
            },
            _ => {}
        }
    }

    state
}

fn parse_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned()))
}

fn append_filter_pairs(serializer: &mut form_urlencoded::Serializer<'_, String>, state: &FilterState) {
    if let Some(name) = state.category.name() {
        serializer.append_pair(CATEGORY, name);
    }
    if state.sort_order != SortOrder::default() {
        serializer.append_pair(SORT, state.sort_order.as_str());
    }
    if !state.search_text.is_empty() {
        serializer.append_pair(SEARCH, &state.search_text);
    }
    if state.rating_threshold.is_active() {
        serializer.append_pair(RATING, &state.rating_threshold.get().to_string());
    }
}

/// Mirrors filter transitions into the address bar.
///
/// Filter writes always replace the current history entry; only
/// [`UrlSynchronizer::open`] establishes a page entry with a push. A reset
/// clears the whole query string, foreign parameters included.
#[derive(Debug, Clone, Default)]
pub struct UrlSynchronizer {
    /// Parameters outside the filter schema, in their original order.
    foreign: Vec<(String, String)>,
}

impl UrlSynchronizer {
    /// Reads the initial address-bar state.
    ///
    /// Returns the decoded filters and the page-entry write that puts the
    /// canonical query string in the address bar.
    pub fn open(&mut self, query: &str) -> (FilterState, Action) {
        self.foreign = parse_pairs(query)
            .filter(|(name, _)| !FILTER_PARAMS.contains(&name.as_str()))
            .collect();

        let state = from_query_string(query);
        let canonical = self.render(&state);
        tracing::debug!(query = %query, canonical = %canonical, "address bar opened");

        (
            state,
            Action::WriteUrl {
                query: canonical,
                mode: HistoryMode::Push,
            },
        )
    }

    /// Query string for `state`, followed by any foreign parameters.
    #[must_use]
    pub fn render(&self, state: &FilterState) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        append_filter_pairs(&mut serializer, state);
        for (name, value) in &self.foreign {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }
}

impl FilterObserver for UrlSynchronizer {
    fn filters_changed(&mut self, change: &FilterChange, actions: &mut Vec<Action>) {
        if change.is_reset {
            self.foreign.clear();
        }
        actions.push(Action::WriteUrl {
            query: self.render(&change.current),
            mode: HistoryMode::Replace,
        });
    }
}
