//! Catalog fetch layer.
//!
//! # Modules
//!
//! - [`catalog`]: The [`CatalogSource`] contract and the bundled sources
//! - [`fetcher`]: Ticketed fetch requests, responses, and the retry loop

pub mod catalog;
pub mod fetcher;

pub use catalog::{CatalogSource, FetchCall, JsonFileCatalog, MemoryCatalog};
pub use fetcher::{fetch_with_retry, FetchRequest, FetchResponse};
