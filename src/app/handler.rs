//! Event handling and state transition logic.
//!
//! [`handle_event`] is the only entry point that mutates a
//! [`BrowseEngine`]. It matches on the event, drives the filter store, the
//! debounce buffer, the sentinel and the cache, and returns the actions the
//! host must execute.
//!
//! # Event Types
//!
//! - **Navigation**: `Open`
//! - **Filters**: `SetCategory`, `SetSortOrder`, `SetRatingThreshold`, `Reset`
//! - **Search input**: `SearchInput`, `SearchTimerElapsed`
//! - **Paging**: `SentinelVisibility`, `LoadMore`, `Retry`
//! - **Fetch layer**: `FetchCompleted`
//! - **Housekeeping**: `Tick`

use super::{Action, BrowseEngine};
use crate::domain::{Category, RatingThreshold, Result, SortOrder};
use crate::filters::DebounceToken;
use crate::source::FetchResponse;

/// Inputs to the engine from the user, the viewport, timers, and fetches.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The page was opened with this address-bar query string.
    ///
    /// Decodes the filters, writes the canonical query string as the page's
    /// history entry, and starts the first fetch if the key is cold.
    Open { query: String },

    SetCategory(Category),
    SetSortOrder(SortOrder),

    /// Raw search box contents after a keystroke. Propagates to the filters
    /// only once the debounce timer elapses.
    SearchInput(String),

    /// A timer armed by [`Action::ArmSearchTimer`] elapsed.
    SearchTimerElapsed(DebounceToken),

    /// Whole-star rating filter, `0` to clear. Values above 5 are rejected.
    SetRatingThreshold(u8),

    /// Restores every filter and drops the cache.
    Reset,

    /// The end-of-list sentinel entered (`true`) or left (`false`) the
    /// viewport.
    SentinelVisibility(bool),

    /// Explicit request for the next page of the active key.
    LoadMore,

    /// Retries the last failed fetch of the active key.
    Retry,

    /// A fetch issued through [`Action::Fetch`] finished.
    FetchCompleted(FetchResponse),

    /// Periodic housekeeping; evicts idle cache entries.
    Tick,
}

impl Event {
    const fn name(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::SetCategory(_) => "set_category",
            Self::SetSortOrder(_) => "set_sort_order",
            Self::SearchInput(_) => "search_input",
            Self::SearchTimerElapsed(_) => "search_timer_elapsed",
            Self::SetRatingThreshold(_) => "set_rating_threshold",
            Self::Reset => "reset",
            Self::SentinelVisibility(_) => "sentinel_visibility",
            Self::LoadMore => "load_more",
            Self::Retry => "retry",
            Self::FetchCompleted(_) => "fetch_completed",
            Self::Tick => "tick",
        }
    }
}

/// Processes an event, mutates the engine, and returns actions to execute.
///
/// # Parameters
///
/// * `engine` - Engine to mutate
/// * `event` - Event to process
///
/// # Returns
///
/// Whether the view may have changed, and the actions to execute in order.
///
/// # Errors
///
/// Returns [`StorefrontError::InvalidFilter`](crate::StorefrontError::InvalidFilter)
/// for a rating threshold above 5. The engine is left untouched in that case.
/// Fetch failures are not errors here; they are recorded on the cache entry
/// and exposed through the view.
///
/// # Example
///
/// ```
/// use storefront::app::{handle_event, Action, Event};
/// use storefront::{initialize, Config};
///
/// let mut engine = initialize(&Config::default());
/// handle_event(&mut engine, &Event::Open { query: String::new() })?;
///
/// let (_, actions) = handle_event(&mut engine, &Event::SearchInput("lamp".into()))?;
/// assert!(matches!(actions[..], [Action::ArmSearchTimer(_)]));
/// assert_eq!(engine.filters().search_text, "");
///
/// assert!(handle_event(&mut engine, &Event::SetRatingThreshold(6)).is_err());
/// # Ok::<(), storefront::StorefrontError>(())
/// ```
pub fn handle_event(engine: &mut BrowseEngine, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = event.name()).entered();

    let mut actions = Vec::new();
    let redraw = match event {
        Event::Open { query } => {
            engine.open(query, &mut actions);
            true
        }
        Event::SetCategory(category) => {
            let change = engine.filters.set_category(category.clone());
            engine.apply(&change, &mut actions);
            change.key_changed()
        }
        Event::SetSortOrder(sort_order) => {
            let change = engine.filters.set_sort_order(*sort_order);
            engine.apply(&change, &mut actions);
            change.key_changed()
        }
        Event::SearchInput(raw) => {
            let timer = engine.search.observe(raw.clone());
            actions.push(Action::ArmSearchTimer(timer));
            false
        }
        Event::SearchTimerElapsed(token) => match engine.search.fire(*token) {
            Some(settled) => {
                tracing::debug!(search_len = settled.len(), "search input settled");
                let change = engine.filters.set_search_text(settled);
                engine.apply(&change, &mut actions);
                change.key_changed()
            }
            None => false,
        },
        Event::SetRatingThreshold(value) => {
            let threshold = RatingThreshold::new(*value)?;
            let change = engine.filters.set_rating_threshold(threshold);
            engine.apply(&change, &mut actions);
            change.key_changed()
        }
        Event::Reset => {
            engine.reset(&mut actions);
            true
        }
        Event::SentinelVisibility(visible) => {
            if engine.sentinel.observe(*visible) {
                tracing::debug!("sentinel entered viewport");
                engine.request_next_page(&mut actions)
            } else {
                false
            }
        }
        Event::LoadMore => engine.request_next_page(&mut actions),
        Event::Retry => engine.retry(&mut actions),
        Event::FetchCompleted(response) => engine.complete(response, &mut actions),
        Event::Tick => {
            let evicted = engine.sweep();
            tracing::trace!(evicted, "tick");
            false
        }
    };

    Ok((redraw, actions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CachePolicy, ManualClock};
    use crate::domain::{FetchError, Item};
    use crate::filters::{from_query_string, to_query_string, HistoryMode};
    use crate::source::FetchRequest;
    use std::time::Duration;

    fn engine() -> BrowseEngine {
        BrowseEngine::new(CachePolicy::default(), Duration::from_millis(400))
            .with_clock(ManualClock::default())
    }

    fn catalog(n: u64) -> Vec<Item> {
        (1..=n)
            .map(|i| Item::new(i, format!("Product {i}"), i as f64))
            .collect()
    }

    fn fetch_of(actions: &[Action]) -> Option<FetchRequest> {
        actions.iter().find_map(|action| match action {
            Action::Fetch(request) => Some(request.clone()),
            _ => None,
        })
    }

    fn respond(engine: &mut BrowseEngine, request: FetchRequest, outcome: std::result::Result<Vec<Item>, FetchError>) -> bool {
        let response = FetchResponse {
            ticket: request.ticket,
            outcome,
            attempts: 1,
        };
        handle_event(engine, &Event::FetchCompleted(response)).unwrap().0
    }

    fn open(engine: &mut BrowseEngine, query: &str) -> FetchRequest {
        let (_, actions) = handle_event(engine, &Event::Open { query: query.to_string() }).unwrap();
        fetch_of(&actions).unwrap()
    }

    #[test]
    fn open_pushes_the_canonical_page_entry() {
        let mut engine = engine();
        let (_, actions) = handle_event(
            &mut engine,
            &Event::Open {
                query: "?rating=9&sort=desc".to_string(),
            },
        )
        .unwrap();

        assert_eq!(
            actions[0],
            Action::WriteUrl {
                query: "sort=desc".to_string(),
                mode: HistoryMode::Push,
            }
        );
        assert_eq!(engine.filters().sort_order, SortOrder::Desc);
    }

    #[test]
    fn sentinel_pages_through_the_catalog() {
        let mut engine = engine();
        let first = open(&mut engine, "");
        respond(&mut engine, first, Ok(catalog(14)));

        let mut counts = vec![(engine.view().items.len(), engine.view().has_more)];
        for _ in 0..2 {
            let (_, actions) = handle_event(&mut engine, &Event::SentinelVisibility(true)).unwrap();
            handle_event(&mut engine, &Event::SentinelVisibility(false)).unwrap();
            respond(&mut engine, fetch_of(&actions).unwrap(), Ok(catalog(14)));
            counts.push((engine.view().items.len(), engine.view().has_more));
        }

        assert_eq!(counts, vec![(6, true), (12, true), (14, false)]);

        let (_, actions) = handle_event(&mut engine, &Event::SentinelVisibility(true)).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn sentinel_waits_for_in_flight_fetch() {
        let mut engine = engine();
        let _first = open(&mut engine, "");

        let (_, actions) = handle_event(&mut engine, &Event::SentinelVisibility(true)).unwrap();
        assert!(actions.is_empty());
        let (_, actions) = handle_event(&mut engine, &Event::LoadMore).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn repeated_visible_reports_fire_once() {
        let mut engine = engine();
        let first = open(&mut engine, "");
        respond(&mut engine, first, Ok(catalog(14)));

        let (_, actions) = handle_event(&mut engine, &Event::SentinelVisibility(true)).unwrap();
        assert!(fetch_of(&actions).is_some());

        for _ in 0..3 {
            let (_, actions) = handle_event(&mut engine, &Event::SentinelVisibility(true)).unwrap();
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn sentinel_seen_during_first_load_continues_after_it_lands() {
        let mut engine = engine();
        let first = open(&mut engine, "");

        // the empty list leaves the sentinel on screen while page one loads
        let (_, actions) = handle_event(&mut engine, &Event::SentinelVisibility(true)).unwrap();
        assert!(actions.is_empty());

        let response = FetchResponse {
            ticket: first.ticket,
            outcome: Ok(catalog(14)),
            attempts: 1,
        };
        let (redraw, actions) = handle_event(&mut engine, &Event::FetchCompleted(response)).unwrap();

        assert!(redraw);
        let next = fetch_of(&actions).unwrap();
        assert_eq!(next.ticket.cursor, 6);
        assert!(engine.view().is_loading_next_page);
    }

    #[test]
    fn reserved_category_spellings_select_the_default_key() {
        let mut engine = engine();
        open(&mut engine, "category=electronics");

        let (_, actions) = handle_event(&mut engine, &Event::SetCategory(Category::parse("all"))).unwrap();

        assert_eq!(
            actions[0],
            Action::WriteUrl {
                query: String::new(),
                mode: HistoryMode::Replace,
            }
        );
        let state = engine.filters().clone();
        assert_eq!(from_query_string(&to_query_string(&state)), state);
        assert_eq!(engine.bound_key(), Some(&crate::QueryKey::default()));
    }

    #[test]
    fn search_propagates_only_after_the_timer() {
        let mut engine = engine();
        open(&mut engine, "");

        let (_, actions) = handle_event(&mut engine, &Event::SearchInput("Product 2".into())).unwrap();
        let Action::ArmSearchTimer(typed) = actions[0] else {
            panic!("expected a timer");
        };
        assert_eq!(typed.delay, Duration::from_millis(400));

        let (_, actions) = handle_event(&mut engine, &Event::SearchInput(String::new())).unwrap();
        let Action::ArmSearchTimer(cleared) = actions[0] else {
            panic!("expected a timer");
        };
        assert_eq!(cleared.delay, Duration::ZERO);

        let (_, actions) = handle_event(&mut engine, &Event::SearchTimerElapsed(cleared.token)).unwrap();
        assert!(fetch_of(&actions).is_none());
        let (_, actions) = handle_event(&mut engine, &Event::SearchTimerElapsed(typed.token)).unwrap();
        assert!(actions.is_empty());

        assert_eq!(engine.filters().search_text, "");
        assert_eq!(engine.cache().len(), 1);
    }

    #[test]
    fn settled_search_rebinds_and_writes_url() {
        let mut engine = engine();
        open(&mut engine, "");

        let (_, actions) = handle_event(&mut engine, &Event::SearchInput("gold ring".into())).unwrap();
        let Action::ArmSearchTimer(timer) = actions[0] else {
            panic!("expected a timer");
        };
        let (redraw, actions) = handle_event(&mut engine, &Event::SearchTimerElapsed(timer.token)).unwrap();

        assert!(redraw);
        assert_eq!(
            actions[0],
            Action::WriteUrl {
                query: "search=gold+ring".to_string(),
                mode: HistoryMode::Replace,
            }
        );
        let request = fetch_of(&actions).unwrap();
        assert_eq!(request.ticket.key.search_text, "gold ring");
        assert_eq!(request.category, None);
    }

    #[test]
    fn failed_page_is_retried_at_the_same_cursor() {
        let mut engine = engine();
        let first = open(&mut engine, "");
        respond(&mut engine, first, Ok(catalog(14)));

        let (_, actions) = handle_event(&mut engine, &Event::LoadMore).unwrap();
        let redraw = respond(&mut engine, fetch_of(&actions).unwrap(), Err(FetchError::Server { status: 503 }));
        assert!(redraw);
        assert_eq!(engine.view().error, Some(&FetchError::Server { status: 503 }));
        assert_eq!(engine.view().items.len(), 6);

        let (_, actions) = handle_event(&mut engine, &Event::Retry).unwrap();
        let retry = fetch_of(&actions).unwrap();
        assert_eq!(retry.ticket.cursor, 6);
        assert!(engine.view().error.is_none());
        assert!(engine.view().is_loading_next_page);
    }

    #[test]
    fn retry_without_failure_does_nothing() {
        let mut engine = engine();
        let first = open(&mut engine, "");
        respond(&mut engine, first, Ok(catalog(3)));

        let (redraw, actions) = handle_event(&mut engine, &Event::Retry).unwrap();
        assert!(!redraw);
        assert!(actions.is_empty());
    }

    #[test]
    fn abandoned_key_response_never_reaches_the_view() {
        let mut engine = engine();
        let slow = open(&mut engine, "");

        let (_, actions) =
            handle_event(&mut engine, &Event::SetCategory(Category::parse("jewelery"))).unwrap();
        let fast = fetch_of(&actions).unwrap();
        respond(&mut engine, fast, Ok(vec![Item::new(7, "Ring", 9.99)]));

        let redraw = respond(&mut engine, slow, Ok(catalog(14)));

        assert!(!redraw);
        let ids: Vec<u64> = engine.view().items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![7]);
        // the abandoned key kept its own page
        assert_eq!(engine.cache().entry(&Default::default()).unwrap().items().len(), 6);
    }

    #[test]
    fn empty_result_reports_empty_state() {
        let mut engine = engine();
        let first = open(&mut engine, "rating=5");
        respond(&mut engine, first, Ok(catalog(4)));

        let view = engine.view();
        assert!(view.items.is_empty());
        assert!(!view.has_more);
        assert_eq!(view.empty_state, Some(crate::app::EmptyState::NoRatingMatches { threshold: 5 }));
    }

    #[test]
    fn invalid_rating_leaves_state_untouched() {
        let mut engine = engine();
        open(&mut engine, "rating=2");

        assert!(handle_event(&mut engine, &Event::SetRatingThreshold(6)).is_err());
        assert_eq!(engine.filters().rating_threshold.get(), 2);
    }
}
