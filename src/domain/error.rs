//! Error types for the storefront engine.
//!
//! This module defines the crate-wide error type [`StorefrontError`], the
//! per-fetch error type [`FetchError`], and a [`Result`] alias. All errors are
//! implemented using the `thiserror` crate.
//!
//! Fetch failures never cross cache-entry boundaries as a `StorefrontError`:
//! they are stored on the entry that issued the fetch and surfaced through
//! the view, so a failed page for one filter combination cannot poison
//! another.

use thiserror::Error;

/// The main error type for storefront operations.
///
/// # Examples
///
/// ```
/// use storefront::StorefrontError;
///
/// fn validate(page_size: usize) -> Result<(), StorefrontError> {
///     if page_size == 0 {
///         return Err(StorefrontError::Config("page_size must be positive".to_string()));
///     }
///     Ok(())
/// }
/// assert!(validate(0).is_err());
/// ```
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration is invalid.
    ///
    /// The string describes the specific configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed as TOML.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A filter value was rejected by its setter.
    ///
    /// Raised for values outside the schema, such as a rating threshold
    /// above 5.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// The last catalog fetch failed and the caller gave up on it, as the
    /// CLI does when a page cannot be loaded.
    #[error("Catalog error: {0}")]
    Catalog(#[from] FetchError),
}

/// Failure of a single `fetch_raw` call.
///
/// Stored on the cache entry that issued the fetch, hence `Clone`. The
/// `Display` output is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response (connection refused, file
    /// missing, timeout).
    #[error("Network error. Check your connection.")]
    Network(String),

    /// The upstream answered with a 5xx status.
    #[error("Server error ({status}). Click to retry.")]
    Server {
        /// HTTP status code.
        status: u16,
    },

    /// The upstream rejected the request with a 4xx status.
    #[error("Request failed ({status}): {message}")]
    Client {
        /// HTTP status code.
        status: u16,
        /// Message reported by the upstream.
        message: String,
    },

    /// The response body was not a valid item list.
    #[error("Unexpected response from catalog: {0}")]
    Decode(String),
}

impl FetchError {
    /// Classifies an HTTP status into a fetch error.
    ///
    /// Statuses below 400 are treated as decode failures since a non-error
    /// status only reaches here when the body could not be used.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            500.. => Self::Server { status },
            400..=499 => Self::Client {
                status,
                message: message.into(),
            },
            _ => Self::Decode(message.into()),
        }
    }

    /// Whether an immediate retry may succeed.
    ///
    /// Network and server failures are transient; client and decode errors
    /// will fail the same way again.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }
}

/// A specialized `Result` type for storefront operations.
pub type Result<T> = std::result::Result<T, StorefrontError>;
