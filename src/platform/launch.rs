//! Starting the freshly installed browser.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::info;

use crate::core::UpdateError;

/// Spawn `executable` detached from this process and return immediately.
pub fn launch_detached(executable: &Path) -> Result<(), UpdateError> {
    let launch_error = |reason: String| UpdateError::Launch {
        path: executable.display().to_string(),
        reason,
    };

    if !executable.is_file() {
        return Err(launch_error("executable not found".to_string()));
    }

    let mut command = Command::new(executable);
    command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    if let Some(dir) = executable.parent() {
        command.current_dir(dir);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    let child = command.spawn().map_err(|e| launch_error(e.to_string()))?;
    info!(path = %executable.display(), pid = child.id(), "Browser launched");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_executable() {
        let temp = TempDir::new().unwrap();
        let result = launch_detached(&temp.path().join("chrome"));
        assert!(matches!(result, Err(UpdateError::Launch { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_launches_script() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("chrome");
        let marker = temp.path().join("launched");
        std::fs::write(&exe, format!("#!/bin/sh\ntouch '{}'\n", marker.display())).unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        launch_detached(&exe).unwrap();

        for _ in 0..50 {
            if marker.exists() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        panic!("launched script never ran");
    }
}
