//! Domain layer for the storefront engine.
//!
//! Core value types, independent of timers, the address bar, or any fetch
//! transport.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`filters`]: Filter facets, [`FilterState`], and the derived [`QueryKey`]
//! - [`item`]: The opaque catalog [`Item`] payload
//!
//! # Examples
//!
//! ```
//! use storefront::domain::{Category, FilterState, Result};
//!
//! fn electronics() -> Result<FilterState> {
//!     Ok(FilterState {
//!         category: Category::parse("electronics"),
//!         ..FilterState::default()
//!     })
//! }
//! assert!(!electronics().unwrap().is_default());
//! ```

pub mod error;
pub mod filters;
pub mod item;

pub use error::{FetchError, Result, StorefrontError};
pub use filters::{Category, FilterState, QueryKey, RatingThreshold, SortOrder};
pub use item::{Item, Rating};
