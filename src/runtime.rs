//! Async driver for the browse engine.
//!
//! [`Storefront`] executes the engine's actions on a single-threaded tokio
//! runtime: address-bar writes happen inline, fetches run concurrently in a
//! [`FuturesUnordered`], and the search debounce is a single deadline that
//! each new keystroke replaces. Nothing here is `Send`; run it on a
//! current-thread runtime or inside a `LocalSet`.
//!
//! Events produced by the driver itself (timer elapsed, fetch completed) are
//! delivered one at a time by [`Storefront::step`], so every engine
//! transition is synchronous and no two overlap.

use crate::app::{handle_event, Action, BrowseEngine, BrowseView, Event};
use crate::domain::{Category, FilterState, Result, SortOrder};
use crate::filters::{AddressBar, DebounceToken};
use crate::source::{fetch_with_retry, CatalogSource, FetchResponse};
use crate::{initialize, Config};
use futures_util::future::LocalBoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::rc::Rc;
use tokio::time::Instant;

pub struct Storefront<S: ?Sized, A> {
    engine: BrowseEngine,
    source: Rc<S>,
    address_bar: A,
    retries: u32,
    fetches: FuturesUnordered<LocalBoxFuture<'static, FetchResponse>>,
    search_deadline: Option<(Instant, DebounceToken)>,
}

impl<S, A> Storefront<S, A>
where
    S: CatalogSource + ?Sized + 'static,
    A: AddressBar,
{
    /// Wraps an engine. Transient fetch failures are retried once.
    #[must_use]
    pub fn new(engine: BrowseEngine, source: Rc<S>, address_bar: A) -> Self {
        Self {
            engine,
            source,
            address_bar,
            retries: 1,
            fetches: FuturesUnordered::new(),
            search_deadline: None,
        }
    }

    /// Builds the engine with [`initialize`] and applies `fetch_retries`.
    #[must_use]
    pub fn from_config(config: &Config, source: Rc<S>, address_bar: A) -> Self {
        Self::new(initialize(config), source, address_bar).with_retries(config.fetch_retries)
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub const fn engine(&self) -> &BrowseEngine {
        &self.engine
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        self.engine.filters()
    }

    #[must_use]
    pub fn view(&self) -> BrowseView<'_> {
        self.engine.view()
    }

    #[must_use]
    pub const fn address_bar(&self) -> &A {
        &self.address_bar
    }

    #[must_use]
    pub fn pending_fetches(&self) -> usize {
        self.fetches.len()
    }

    #[must_use]
    pub const fn search_pending(&self) -> bool {
        self.search_deadline.is_some()
    }

    /// Reads the address bar and loads the first page of its filters.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn open(&mut self) -> Result<bool> {
        let query = self.address_bar.query_string();
        self.dispatch(Event::Open { query })
    }

    /// Feeds one event to the engine and executes its actions.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`handle_event`]; no action is executed in
    /// that case.
    pub fn dispatch(&mut self, event: Event) -> Result<bool> {
        let (redraw, actions) = handle_event(&mut self.engine, &event)?;
        for action in actions {
            self.execute(action);
        }
        Ok(redraw)
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::WriteUrl { query, mode } => {
                tracing::debug!(query = %query, ?mode, "writing address bar");
                self.address_bar.set_query_string(&query, mode);
            }
            Action::Fetch(request) => {
                tracing::debug!(
                    ticket = request.ticket.id,
                    category = ?request.category,
                    cursor = request.ticket.cursor,
                    "dispatching fetch"
                );
                self.fetches
                    .push(fetch_with_retry(Rc::clone(&self.source), request, self.retries));
            }
            Action::ArmSearchTimer(timer) => {
                self.search_deadline = Some((Instant::now() + timer.delay, timer.token));
            }
        }
    }

    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn set_category(&mut self, category: &str) -> Result<bool> {
        self.dispatch(Event::SetCategory(Category::parse(category)))
    }

    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn set_sort_order(&mut self, sort_order: SortOrder) -> Result<bool> {
        self.dispatch(Event::SetSortOrder(sort_order))
    }

    /// # Errors
    ///
    /// Returns [`StorefrontError::InvalidFilter`](crate::StorefrontError::InvalidFilter)
    /// for a threshold above 5.
    pub fn set_rating_threshold(&mut self, threshold: u8) -> Result<bool> {
        self.dispatch(Event::SetRatingThreshold(threshold))
    }

    /// Records a keystroke in the search box. The filter follows after the
    /// debounce delay, during a later [`Storefront::step`].
    ///
    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn search_input(&mut self, raw: &str) -> Result<bool> {
        self.dispatch(Event::SearchInput(raw.to_string()))
    }

    /// Clears filters, address-bar parameters, and the cache, then loads the
    /// first default page.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn reset(&mut self) -> Result<bool> {
        self.search_deadline = None;
        self.dispatch(Event::Reset)
    }

    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn sentinel_visible(&mut self) -> Result<bool> {
        self.dispatch(Event::SentinelVisibility(true))
    }

    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn sentinel_hidden(&mut self) -> Result<bool> {
        self.dispatch(Event::SentinelVisibility(false))
    }

    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn request_next_page(&mut self) -> Result<bool> {
        self.dispatch(Event::LoadMore)
    }

    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn retry(&mut self) -> Result<bool> {
        self.dispatch(Event::Retry)
    }

    /// Evicts idle cache entries.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn tick(&mut self) -> Result<bool> {
        self.dispatch(Event::Tick)
    }

    /// Waits for the next timer or fetch completion and applies it.
    ///
    /// When the debounce deadline and a fetch are both ready, the timer is
    /// applied first.
    ///
    /// # Returns
    ///
    /// `Ok(false)` when nothing is pending.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub async fn step(&mut self) -> Result<bool> {
        let event = match self.search_deadline {
            Some((deadline, token)) => tokio::select! {
                biased;
                () = tokio::time::sleep_until(deadline) => {
                    self.search_deadline = None;
                    Event::SearchTimerElapsed(token)
                }
                Some(response) = self.fetches.next() => Event::FetchCompleted(response),
            },
            None => match self.fetches.next().await {
                Some(response) => Event::FetchCompleted(response),
                None => return Ok(false),
            },
        };

        self.dispatch(event)?;
        Ok(true)
    }

    /// Steps until no timer or fetch is pending.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub async fn settle(&mut self) -> Result<()> {
        while self.step().await? {}
        Ok(())
    }
}
