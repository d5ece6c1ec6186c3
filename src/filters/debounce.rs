//! Debounced input buffer for the free-text search box.
//!
//! The buffer is a small state machine that owns no timer of its own. Each
//! [`Debouncer::observe`] call returns a [`DebounceTimer`] that the host arms;
//! when the timer elapses the host calls [`Debouncer::fire`] with the timer's
//! token. Observing a new value supersedes every earlier token, so a stale
//! timer firing late is a no-op.
//!
//! # State Machine
//!
//! ```text
//!            observe(v)                 fire(token)
//!   Idle ───────────────► Pending ─────────────────► Settled(v)
//!     ▲                    │   ▲                        │
//!     │ cancel()           │   └──── observe(v') ───────┘
//!     └────────────────────┘        (new token, new delay)
//! ```
//!
//! Observing the empty string arms a zero-delay timer: clearing the box is an
//! explicit intent and must not wait out the typing delay, and it overrides
//! any timer still pending for a half-typed query.

use std::time::Duration;

/// Default delay between the last keystroke and propagation.
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(400);

/// Identifies one armed timer. Only the most recent token can settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceToken(u64);

/// Timer the host must arm after an [`Debouncer::observe`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTimer {
    pub token: DebounceToken,
    pub delay: Duration,
}

/// Current state of the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceState {
    /// Nothing observed since construction or the last cancel.
    Idle,
    /// A value is waiting for its timer.
    Pending { token: DebounceToken, value: String },
    /// The last observed value has propagated.
    Settled(String),
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    state: DebounceState,
    next_token: u64,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_DELAY)
    }
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: DebounceState::Idle,
            next_token: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &DebounceState {
        &self.state
    }

    /// The most recently observed raw value, settled or not.
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        match &self.state {
            DebounceState::Idle => None,
            DebounceState::Pending { value, .. } | DebounceState::Settled(value) => Some(value),
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }

    /// Records a new raw value and returns the timer that will settle it.
    ///
    /// Any previously armed timer is superseded.
    pub fn observe(&mut self, raw: impl Into<String>) -> DebounceTimer {
        let value = raw.into();
        let token = DebounceToken(self.next_token);
        self.next_token += 1;

        let delay = if value.is_empty() { Duration::ZERO } else { self.delay };

        tracing::trace!(token = token.0, delay_ms = delay.as_millis(), "debounce armed");
        self.state = DebounceState::Pending { token, value };
        DebounceTimer { token, delay }
    }

    /// Settles the pending value if `token` is the current timer.
    ///
    /// Returns the settled value, or `None` for a superseded or cancelled
    /// timer.
    pub fn fire(&mut self, token: DebounceToken) -> Option<String> {
        match &self.state {
            DebounceState::Pending { token: current, value } if *current == token => {
                let value = value.clone();
                self.state = DebounceState::Settled(value.clone());
                Some(value)
            }
            _ => {
                tracing::trace!(token = token.0, "stale debounce timer ignored");
                None
            }
        }
    }

    /// Drops any pending value without settling it.
    pub fn cancel(&mut self) {
        if self.is_pending() {
            tracing::debug!("pending search input cancelled");
        }
        self.state = DebounceState::Idle;
    }
}
