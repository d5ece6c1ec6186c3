//! Tracing subscriber setup.

use super::log_file::RotatingLogFile;
use crate::Config;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// Events go through an [`EnvFilter`] and a `fmt` layer that writes either
/// to stderr or, when `trace_file` is set, to a size-rotated log file.
///
/// # Parameters
///
/// * `config` - Supplies `trace_level` and the optional `trace_file`
///
/// # Level Resolution
///
/// 1. `RUST_LOG`, if set and valid
/// 2. `config.trace_level`
/// 3. `"info"` if neither parses
///
/// # Initialization Behavior
///
/// Idempotent: only the first call installs a subscriber. If the log file
/// cannot be prepared, logging falls back to stderr and says so.
///
/// # Example
///
/// ```
/// use storefront::observability::init_tracing;
/// use storefront::Config;
///
/// init_tracing(&Config::default());
/// init_tracing(&Config::default()); // no-op
/// tracing::info!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.trace_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let mut fallback_reason = None;
    let log_file = config.trace_file.as_ref().and_then(|path| {
        RotatingLogFile::new(path)
            .map_err(|e| fallback_reason = Some(format!("{}: {e}", path.display())))
            .ok()
    });

    let (file_layer, stderr_layer) = match log_file {
        Some(log) => (
            Some(fmt::layer().with_ansi(false).with_writer(Arc::new(log))),
            None,
        ),
        None => (None, Some(fmt::layer().with_writer(std::io::stderr))),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if let (true, Some(reason)) = (installed, fallback_reason) {
        tracing::warn!(reason = %reason, "log file unavailable, logging to stderr");
    }
}
