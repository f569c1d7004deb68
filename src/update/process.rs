//! Running-instance guard.
//!
//! Overwriting the files of a live browser either fails with access-denied
//! errors or leaves a corrupted install, so the orchestrator asks a
//! [`ProcessProbe`] before touching the installation directory.

use sysinfo::{ProcessRefreshKind, RefreshKind, System};
use tracing::debug;

/// Answers whether a process with a given name is currently running.
///
/// Implementations may block; async callers run them on a blocking worker.
pub trait ProcessProbe: Send + Sync {
    fn is_running(&self, name: &str) -> bool;
}

/// Process table lookup through `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessProbe;

impl ProcessProbe for SystemProcessProbe {
    fn is_running(&self, name: &str) -> bool {
        let system = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::new()),
        );
        let running = system
            .processes()
            .values()
            .any(|process| process_name_matches(process.name(), name));
        debug!(process = name, running, "Checked process table");
        running
    }
}

/// Case-insensitive comparison that ignores a trailing `.exe` on either side.
pub fn process_name_matches(actual: &str, wanted: &str) -> bool {
    strip_exe(actual).eq_ignore_ascii_case(strip_exe(wanted))
}

fn strip_exe(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
        &name[..len - 4]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matching() {
        assert!(process_name_matches("chrome.exe", "chrome"));
        assert!(process_name_matches("CHROME.EXE", "chrome"));
        assert!(process_name_matches("chrome", "chrome.exe"));
        assert!(process_name_matches("Chromium", "chromium"));
        assert!(!process_name_matches("chrome_crashpad_handler", "chrome"));
        assert!(!process_name_matches("chromedriver.exe", "chrome"));
        assert!(!process_name_matches(".exe", ""));
    }

    #[test]
    fn test_system_probe_does_not_find_nonsense() {
        assert!(!SystemProcessProbe.is_running("chromup-no-such-process-3f9c2a"));
    }
}
