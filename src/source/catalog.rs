//! Upstream catalog sources.
//!
//! The upstream supports exactly two parameters: a category (or none, for
//! everything) and a sort direction. It returns the full matching set in one
//! response; paging, search, and rating filters are layered on top by the
//! cache.

use crate::domain::{FetchError, Item, SortOrder};
use futures_util::future::{FutureExt, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

/// The raw fetch function consumed by the engine.
///
/// The returned future owns everything it needs, so the caller may keep it
/// across later calls to the source.
pub trait CatalogSource {
    fn fetch_raw(
        &self,
        category: Option<&str>,
        sort_order: SortOrder,
    ) -> LocalBoxFuture<'static, Result<Vec<Item>, FetchError>>;
}

fn in_category(items: &[Item], category: Option<&str>) -> Vec<Item> {
    match category {
        None => items.to_vec(),
        Some(name) => items.iter().filter(|item| item.category == name).cloned().collect(),
    }
}

/// One recorded `fetch_raw` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub category: Option<String>,
    pub sort_order: SortOrder,
}

#[derive(Debug, Default)]
struct MemoryInner {
    items: RefCell<Vec<Item>>,
    calls: RefCell<Vec<FetchCall>>,
    failures: RefCell<VecDeque<FetchError>>,
    latency: Cell<Duration>,
    category_latency: RefCell<HashMap<Option<String>, Duration>>,
}

/// In-memory catalog with scripted latency and failures.
///
/// Clones share state, so a test can keep a handle to inspect calls after
/// moving the source into a driver.
///
/// ```
/// use storefront::source::{CatalogSource, MemoryCatalog};
/// use storefront::domain::SortOrder;
/// use storefront::Item;
///
/// let catalog = MemoryCatalog::new(vec![Item::new(1, "Lamp", 20.0).with_category("home")]);
/// let _pending = catalog.fetch_raw(Some("home"), SortOrder::Asc);
/// assert_eq!(catalog.call_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    inner: Rc<MemoryInner>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        let catalog = Self::default();
        catalog.set_items(items);
        catalog
    }

    pub fn set_items(&self, items: Vec<Item>) {
        *self.inner.items.borrow_mut() = items;
    }

    /// Delay applied to every response.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.inner.latency.set(latency);
        self
    }

    /// Delay for one category, overriding the default latency.
    pub fn set_category_latency(&self, category: Option<&str>, latency: Duration) {
        self.inner
            .category_latency
            .borrow_mut()
            .insert(category.map(String::from), latency);
    }

    /// Makes the next call fail with `error`. Queued failures are consumed
    /// in order.
    pub fn fail_next(&self, error: FetchError) {
        self.inner.failures.borrow_mut().push_back(error);
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.calls.borrow().len()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<FetchCall> {
        self.inner.calls.borrow().clone()
    }
}

impl CatalogSource for MemoryCatalog {
    fn fetch_raw(
        &self,
        category: Option<&str>,
        sort_order: SortOrder,
    ) -> LocalBoxFuture<'static, Result<Vec<Item>, FetchError>> {
        self.inner.calls.borrow_mut().push(FetchCall {
            category: category.map(String::from),
            sort_order,
        });

        let latency = self
            .inner
            .category_latency
            .borrow()
            .get(&category.map(String::from))
            .copied()
            .unwrap_or_else(|| self.inner.latency.get());
        let outcome = match self.inner.failures.borrow_mut().pop_front() {
            Some(error) => Err(error),
            None => Ok(in_category(&self.inner.items.borrow(), category)),
        };

        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            outcome
        }
        .boxed_local()
    }
}

/// Catalog read from a JSON array of items on disk.
///
/// The file is re-read on every call, so edits show up on the next cold
/// fetch.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogSource for JsonFileCatalog {
    fn fetch_raw(
        &self,
        category: Option<&str>,
        sort_order: SortOrder,
    ) -> LocalBoxFuture<'static, Result<Vec<Item>, FetchError>> {
        let path = self.path.clone();
        let category = category.map(String::from);

        async move {
            tracing::debug!(path = %path.display(), category = ?category, sort_order = %sort_order, "reading catalog file");
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| FetchError::Network(format!("{}: {e}", path.display())))?;
            let items: Vec<Item> =
                serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
            Ok(in_category(&items, category.as_deref()))
        }
        .boxed_local()
    }
}
