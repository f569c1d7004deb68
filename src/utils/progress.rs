//! Progress indicators for downloads and extraction.
//!
//! Thin wrapper over `indicatif` so every bar in the tool has the same look.
//! Bars are hidden when:
//! - `CHROMUP_NO_PROGRESS` is set to any value
//! - `--no-progress` was passed (see [`disable_progress`])
//! - stderr is not a terminal
//!
//! # Examples
//!
//! ```rust,no_run
//! use chromup::utils::progress::ProgressBar;
//!
//! let bar = ProgressBar::new_bytes(Some(1024 * 1024));
//! bar.set_prefix("Downloading");
//! bar.set_position(512 * 1024);
//! bar.finish_with_message("done");
//! ```

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

use crate::constants::NO_PROGRESS_ENV;

static PROGRESS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Hide every progress indicator created from now on.
pub fn disable_progress() {
    PROGRESS_DISABLED.store(true, Ordering::Relaxed);
}

fn is_progress_disabled() -> bool {
    PROGRESS_DISABLED.load(Ordering::Relaxed)
        || std::env::var_os(NO_PROGRESS_ENV).is_some()
        || !std::io::stderr().is_terminal()
}

/// A progress bar with consistent styling.
///
/// Cloning shares the underlying bar.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Bar counting discrete items, e.g. archive entries.
    pub fn new(len: u64) -> Self {
        Self::build(|| {
            let bar = IndicatifBar::new(len);
            bar.set_style(ProgressStyle::default_style());
            bar
        })
    }

    /// Byte-oriented bar; falls back to a spinner when the size is unknown.
    pub fn new_bytes(total: Option<u64>) -> Self {
        match total {
            Some(total) => Self::build(|| {
                let bar = IndicatifBar::new(total);
                bar.set_style(ProgressStyle::download());
                bar
            }),
            None => Self::build(|| {
                let bar = IndicatifBar::new_spinner();
                bar.set_style(ProgressStyle::download_unknown());
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }),
        }
    }

    fn build(make: impl FnOnce() -> IndicatifBar) -> Self {
        let inner = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            make()
        };
        Self { inner }
    }

    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// Shared bar styles.
pub struct ProgressStyle;

impl ProgressStyle {
    pub fn default_style() -> IndicatifStyle {
        template(
            IndicatifStyle::default_bar(),
            "{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .progress_chars("━╸━")
    }

    /// Transferred/total, percentage, and whatever the caller puts in `{msg}`
    /// (speed and ETA computed from the transfer itself).
    pub fn download() -> IndicatifStyle {
        template(
            IndicatifStyle::default_bar(),
            "{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {percent:>3}% {msg}",
        )
        .progress_chars("━╸━")
    }

    pub fn download_unknown() -> IndicatifStyle {
        template(
            IndicatifStyle::default_spinner(),
            "{prefix:.bold.cyan} {spinner:.cyan} {bytes} {msg}",
        )
    }
}

/// Falls back to the unstyled base when the template is rejected.
fn template(base: IndicatifStyle, template: &str) -> IndicatifStyle {
    match base.clone().template(template) {
        Ok(style) => style,
        Err(_) => base,
    }
}

/// Human readable transfer rate, e.g. `1.5 MB/s`.
pub fn format_speed(bytes_per_second: f64) -> String {
    const UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];
    if !bytes_per_second.is_finite() || bytes_per_second <= 0.0 {
        return "0 B/s".to_string();
    }
    let mut value = bytes_per_second;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Remaining time as `MM:SS` (or `H:MM:SS`); `--:--` when indeterminate.
pub fn format_eta(eta: Option<Duration>) -> String {
    let Some(eta) = eta else {
        return "--:--".to_string();
    };
    let secs = eta.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
