//! Structured logging setup.
//!
//! All crate modules log through `tracing` (spans per handled event and
//! cache operation, structured fields on every event). This module only
//! decides where those records go.
//!
//! # Configuration
//!
//! Verbosity is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` in the configuration file
//! 3. Default: `"info"`
//!
//! Output goes to stderr unless `trace_file` is set.
//!
//! # Modules
//!
//! - `init`: Subscriber setup
//! - `log_file`: Size-rotated log file writer

mod init;
mod log_file;

pub use init::init_tracing;
pub use log_file::RotatingLogFile;
