//! Side effects requested by the event handler.
//!
//! The engine never touches the address bar, a timer, or the network
//! itself. Each [`handle_event`](crate::app::handle_event) call returns the
//! actions the host must perform, in order. The async driver in
//! [`runtime`](crate::runtime) is the stock executor; tests may also inspect
//! the actions directly.
//!
//! # Example
//!
//! ```
//! use storefront::app::{handle_event, Action, Event};
//! use storefront::{initialize, Config};
//!
//! let mut engine = initialize(&Config::default());
//! let (_, actions) = handle_event(&mut engine, &Event::Open { query: "?sort=desc".into() })?;
//! assert!(matches!(actions[0], Action::WriteUrl { .. }));
//! assert!(matches!(actions[1], Action::Fetch(_)));
//! # Ok::<(), storefront::StorefrontError>(())
//! ```

use crate::filters::{DebounceTimer, HistoryMode};
use crate::source::FetchRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Writes the query string to the address bar.
    WriteUrl {
        query: String,
        mode: HistoryMode,
    },

    /// Runs a ticketed upstream fetch and reports back with
    /// [`Event::FetchCompleted`](crate::app::Event::FetchCompleted).
    Fetch(FetchRequest),

    /// Arms the search debounce timer. When it elapses the host sends
    /// [`Event::SearchTimerElapsed`](crate::app::Event::SearchTimerElapsed)
    /// with the same token. Earlier timers may be dropped or left to fire;
    /// superseded tokens are ignored.
    ArmSearchTimer(DebounceTimer),
}
