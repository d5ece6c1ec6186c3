//! Storefront: a faceted catalog browsing engine.
//!
//! Storefront lets a user page through a product catalog while filtering by
//! category, sorting by price, searching by free text, and filtering by
//! rating:
//! - Filter state mirrored into the address bar, with defaults omitted
//! - Debounced free-text search
//! - Keyed page cache with request coalescing and stale-response isolation
//! - Infinite scroll driven by a viewport sentinel
//! - One-step reset across filters, address bar, and cache
//!
//! The upstream catalog supports neither pagination nor combined filters:
//! it returns the whole category in one response. Sorting, the search and
//! rating predicates, and windowing all happen here.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Driver (runtime.rs)                                │  ← tokio, current thread
//! │  - arms debounce timers, runs fetches               │
//! └─────────────────────────────────────────────────────┘
//!                        │ Events ↓   ↑ Actions
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← sans-IO state machine
//! │  - Event handling, reset coordination, sentinel     │
//! │  - View computation                                 │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Filters       │   │ Cache         │   │ Source        │
//! │ (filters/)    │   │ (cache/)      │   │ (source/)     │
//! │ - Debounce    │   │ - Listing     │   │ - Catalogs    │
//! │ - Store       │   │ - Entries     │   │ - Retry loop  │
//! │ - URL codec   │   │ - Eviction    │   │               │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (domain/): filters, items, errors           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Engine state machine with event/action model
//! - [`domain`]: Core value types and errors
//! - [`filters`]: Debounce buffer, filter store, URL synchronizer
//! - [`cache`]: Paginated fetch cache
//! - [`source`]: Catalog sources and the fetch retry loop
//! - [`runtime`]: Async driver
//! - [`observability`]: Tracing subscriber setup
//!
//! # Configuration
//!
//! ```toml
//! page_size = 6
//! stale_after_secs = 300
//! retain_for_secs = 600
//! debounce_ms = 400
//! fetch_retries = 1
//! trace_level = "info"
//! # trace_file = "/var/log/storefront.log"
//! ```
//!
//! # Example
//!
//! ```
//! use storefront::filters::MemoryAddressBar;
//! use storefront::source::MemoryCatalog;
//! use storefront::{Config, Item, Storefront};
//! use std::rc::Rc;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build()?.block_on(async {
//! let catalog = MemoryCatalog::new((1..=14).map(|i| Item::new(i, format!("Product {i}"), i as f64)).collect());
//! let mut store = Storefront::from_config(&Config::default(), Rc::new(catalog), MemoryAddressBar::new("?sort=desc"));
//!
//! store.open()?;
//! store.settle().await?;
//! assert_eq!(store.view().items.len(), 6);
//! assert_eq!(store.view().items[0].id, 14);
//!
//! store.sentinel_visible()?;
//! store.sentinel_hidden()?;
//! store.settle().await?;
//! assert_eq!(store.view().items.len(), 12);
//! # Ok::<(), storefront::StorefrontError>(())
//! # })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![allow(clippy::multiple_crate_versions)]

pub mod app;
pub mod cache;
pub mod domain;
pub mod filters;
pub mod observability;
pub mod runtime;
pub mod source;

pub use app::{handle_event, Action, BrowseEngine, BrowseView, EmptyState, Event};
pub use domain::{FetchError, FilterState, Item, QueryKey, Result, StorefrontError};
pub use runtime::Storefront;

use cache::CachePolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted cache lifetime (one year).
const MAX_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

/// Engine configuration, read from TOML.
///
/// Every field is optional; missing fields take their defaults.
///
/// # Example
///
/// ```
/// use storefront::Config;
///
/// let config = Config::from_toml_str("page_size = 12\ntrace_level = \"debug\"")?;
/// assert_eq!(config.page_size, 12);
/// assert_eq!(config.debounce_ms, 400);
/// # Ok::<(), storefront::StorefrontError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Items per page. Default: 6
    pub page_size: usize,

    /// Seconds a fetched entry stays fresh. Default: 300
    pub stale_after_secs: u64,

    /// Seconds an entry without readers is retained. Must not be shorter
    /// than `stale_after_secs`. Default: 600
    pub retain_for_secs: u64,

    /// Search debounce delay in milliseconds. Default: 400
    pub debounce_ms: u64,

    /// Immediate retries after a transient fetch failure. Default: 1
    pub fetch_retries: u32,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`, or any directive
    /// such as `storefront::cache=debug`. Default: `"info"`
    pub trace_level: String,

    /// Write logs to this file (size-rotated) instead of stderr.
    pub trace_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: cache::DEFAULT_PAGE_SIZE,
            stale_after_secs: 300,
            retain_for_secs: 600,
            debounce_ms: 400,
            fetch_retries: 1,
            trace_level: "info".to_string(),
            trace_file: None,
        }
    }
}

impl Config {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` for malformed TOML and `Config` for values that
    /// fail [`Config::validate`].
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`Config::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading configuration");
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(StorefrontError::Config("page_size must be positive".to_string()));
        }
        for (name, secs) in [
            ("stale_after_secs", self.stale_after_secs),
            ("retain_for_secs", self.retain_for_secs),
        ] {
            if secs > MAX_LIFETIME_SECS {
                return Err(StorefrontError::Config(format!(
                    "{name} must be at most {MAX_LIFETIME_SECS}"
                )));
            }
        }
        if self.retain_for_secs < self.stale_after_secs {
            return Err(StorefrontError::Config(
                "retain_for_secs must not be shorter than stale_after_secs".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            page_size: self.page_size,
            stale_after: lifetime(self.stale_after_secs),
            retain_for: lifetime(self.retain_for_secs),
        }
    }

    #[must_use]
    pub const fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn lifetime(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(secs.min(MAX_LIFETIME_SECS)).unwrap_or_default())
}

/// Builds an engine from configuration.
///
/// The engine starts unbound with default filters; send
/// [`Event::Open`] (or call [`Storefront::open`]) to read the address bar
/// and fetch the first page.
///
/// # Example
///
/// ```
/// use storefront::{initialize, Config};
///
/// let engine = initialize(&Config::default());
/// assert!(engine.filters().is_default());
/// assert!(engine.bound_key().is_none());
/// ```
#[must_use]
pub fn initialize(config: &Config) -> BrowseEngine {
    tracing::debug!(
        page_size = config.page_size,
        stale_after_secs = config.stale_after_secs,
        retain_for_secs = config.retain_for_secs,
        debounce_ms = config.debounce_ms,
        "initializing storefront engine"
    );
    BrowseEngine::new(config.cache_policy(), config.debounce_delay())
}
