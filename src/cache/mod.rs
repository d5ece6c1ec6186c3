//! Paginated fetch cache.
//!
//! # Modules
//!
//! - [`clock`]: Time source for freshness and retention
//! - [`listing`]: Sort, filter, and window a raw upstream result
//! - [`entry`]: Accumulated items and cursor for one query key
//! - [`store`]: Keyed cache with coalescing, staleness, and eviction

pub mod clock;
pub mod entry;
pub mod listing;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, FetchTicket};
pub use listing::Window;
pub use store::{Binding, CachePolicy, Completion, FetchStart, PageCache, DEFAULT_PAGE_SIZE};
