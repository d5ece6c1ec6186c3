//! Filter input, state, and address-bar mirroring.
//!
//! # Modules
//!
//! - [`debounce`]: Debounced input buffer for the search box
//! - [`store`]: Filter state store and the observer contract
//! - [`url`]: Query-string codec and the address-bar synchronizer

pub mod debounce;
pub mod store;
pub mod url;

pub use debounce::{DebounceState, DebounceTimer, DebounceToken, Debouncer};
pub use store::{notify_observers, FilterChange, FilterObserver, FilterStore};
pub use url::{from_query_string, to_query_string, AddressBar, HistoryMode, MemoryAddressBar, UrlSynchronizer};
