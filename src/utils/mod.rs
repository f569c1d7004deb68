//! Cross-cutting helpers for the command line front end.
//!
//! - [`progress`]: styled `indicatif` bars for downloads and extraction
//! - [`logging`]: console and persistent-file tracing setup

pub mod logging;
pub mod progress;

pub use logging::{Verbosity, init_logging};
pub use progress::{ProgressBar, ProgressStyle, format_eta, format_speed};
