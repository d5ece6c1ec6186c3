//! Application layer coordinating filters, cache, and side effects.
//!
//! # Architecture
//!
//! The application layer follows a unidirectional data flow pattern:
//!
//! ```text
//! Host input → Events → handle_event → Engine mutations → Actions → Host effects
//!                            ↑                                         ↓
//!                            └────── timers elapse, fetches complete ───┘
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effect commands emitted by the event handler
//! - [`handler`]: Event processing and state transition coordinator
//! - [`state`]: The [`BrowseEngine`] and its cache key binding
//! - [`sentinel`]: End-of-list visibility edge detection
//! - [`reset`]: Ordered reset across filters, address bar, and cache
//! - [`view`]: Read-only view of the active result list

pub mod actions;
pub mod handler;
pub mod reset;
pub mod sentinel;
pub mod state;
pub mod view;

pub use actions::Action;
pub use handler::{handle_event, Event};
pub use sentinel::Sentinel;
pub use state::BrowseEngine;
pub use view::{BrowseView, EmptyState};
