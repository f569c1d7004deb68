//! Desktop shortcuts for the installed browser.
//!
//! Three shortcuts are created next to each other:
//!
//! | Name                         | Profile location                 |
//! |------------------------------|----------------------------------|
//! | `Chromium`                   | browser default                  |
//! | `Chromium - Common Profile`  | `<app dir>/profile`              |
//! | `Chromium - Single Profile`  | `<install dir>/profile`          |
//!
//! Each platform has its own [`ShortcutWriter`]: Windows `.lnk` files are
//! produced by a generated Windows Script Host script, Linux gets XDG
//! `.desktop` entries and macOS gets executable `.command` scripts.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::core::UpdateError;

const SHORTCUT_BASE_NAME: &str = "Chromium";

/// What a shortcut points at and where it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutSpec {
    /// File name without extension.
    pub name: String,
    pub target: PathBuf,
    pub arguments: Vec<String>,
    pub working_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl ShortcutSpec {
    pub fn new(name: impl Into<String>, target: &Path, output_dir: &Path) -> Self {
        Self {
            name: name.into(),
            target: target.to_path_buf(),
            arguments: Vec::new(),
            working_dir: target.parent().map(Path::to_path_buf).unwrap_or_default(),
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }
}

pub trait ShortcutWriter: Send + Sync {
    /// Write (or overwrite) the shortcut, returning the file created.
    fn create_shortcut(&self, spec: &ShortcutSpec) -> Result<PathBuf, UpdateError>;
}

/// The writer for the platform this binary was built for.
pub fn native_writer() -> Box<dyn ShortcutWriter> {
    if cfg!(windows) {
        Box::new(WindowsShortcutWriter)
    } else if cfg!(target_os = "macos") {
        Box::new(CommandScriptWriter)
    } else {
        Box::new(DesktopEntryWriter)
    }
}

/// Plain, common-profile and single-profile shortcuts for `executable`.
pub fn standard_shortcuts(
    executable: &Path,
    app_dir: &Path,
    install_dir: &Path,
    profile_dir_name: &str,
    output_dir: &Path,
) -> Vec<ShortcutSpec> {
    let common = app_dir.join(profile_dir_name);
    let single = install_dir.join(profile_dir_name);
    vec![
        ShortcutSpec::new(SHORTCUT_BASE_NAME, executable, output_dir),
        ShortcutSpec::new(format!("{SHORTCUT_BASE_NAME} - Common Profile"), executable, output_dir)
            .with_argument(format!("--user-data-dir={}", common.display())),
        ShortcutSpec::new(format!("{SHORTCUT_BASE_NAME} - Single Profile"), executable, output_dir)
            .with_argument(format!("--user-data-dir={}", single.display())),
    ]
}

/// Write every spec, logging failures instead of stopping at the first one.
pub fn create_all(writer: &dyn ShortcutWriter, specs: &[ShortcutSpec]) -> Vec<Result<PathBuf, UpdateError>> {
    specs
        .iter()
        .map(|spec| {
            let result = writer.create_shortcut(spec);
            match &result {
                Ok(path) => debug!(path = %path.display(), "Shortcut created"),
                Err(e) => warn!(shortcut = %spec.name, error = %e, "Shortcut creation failed"),
            }
            result
        })
        .collect()
}

fn ensure_output_dir(spec: &ShortcutSpec) -> Result<(), UpdateError> {
    fs::create_dir_all(&spec.output_dir).map_err(|e| UpdateError::Shortcut {
        reason: format!("cannot create {}: {e}", spec.output_dir.display()),
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), UpdateError> {
    fs::write(path, content).map_err(|e| UpdateError::Shortcut {
        reason: format!("cannot write {}: {e}", path.display()),
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), UpdateError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| UpdateError::Shortcut {
        reason: format!("cannot mark {} executable: {e}", path.display()),
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), UpdateError> {
    Ok(())
}

/// `.lnk` files via `WScript.Shell.CreateShortcut`, driven by a temporary script.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsShortcutWriter;

impl WindowsShortcutWriter {
    /// VBScript that creates `link` for `spec`.
    pub fn render_script(spec: &ShortcutSpec, link: &Path) -> String {
        let arguments = spec.arguments.iter().map(|a| windows_quote(a)).collect::<Vec<_>>().join(" ");
        format!(
            "Set WshShell = CreateObject(\"WScript.Shell\")\r\n\
             Set Shortcut = WshShell.CreateShortcut(\"{link}\")\r\n\
             Shortcut.TargetPath = \"{target}\"\r\n\
             Shortcut.Arguments = \"{arguments}\"\r\n\
             Shortcut.WorkingDirectory = \"{working_dir}\"\r\n\
             Shortcut.Save\r\n",
            link = vbs_escape(&link.display().to_string()),
            target = vbs_escape(&spec.target.display().to_string()),
            arguments = vbs_escape(&arguments),
            working_dir = vbs_escape(&spec.working_dir.display().to_string()),
        )
    }
}

impl ShortcutWriter for WindowsShortcutWriter {
    fn create_shortcut(&self, spec: &ShortcutSpec) -> Result<PathBuf, UpdateError> {
        ensure_output_dir(spec)?;
        let link = spec.output_dir.join(format!("{}.lnk", spec.name));
        let script = std::env::temp_dir().join(format!("chromup-shortcut-{}.vbs", std::process::id()));
        write_file(&script, &Self::render_script(spec, &link))?;

        let status = Command::new("wscript.exe").arg("//B").arg("//Nologo").arg(&script).status();
        let _ = fs::remove_file(&script);

        match status {
            Ok(status) if status.success() => Ok(link),
            Ok(status) => Err(UpdateError::Shortcut {
                reason: format!("wscript exited with {status} while creating {}", link.display()),
            }),
            Err(e) => Err(UpdateError::Shortcut {
                reason: format!("cannot run wscript: {e}"),
            }),
        }
    }
}

/// Quote one argument for a Windows command line.
fn windows_quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains([' ', '\t']) {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

fn vbs_escape(value: &str) -> String {
    value.replace('"', "\"\"")
}

/// XDG `.desktop` launcher entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopEntryWriter;

impl DesktopEntryWriter {
    pub fn render_entry(spec: &ShortcutSpec) -> String {
        let mut exec = desktop_quote(&spec.target.display().to_string());
        for argument in &spec.arguments {
            exec.push(' ');
            exec.push_str(&desktop_quote(argument));
        }
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name={name}\n\
             Exec={exec}\n\
             Path={path}\n\
             Icon=chromium\n\
             Terminal=false\n\
             Categories=Network;WebBrowser;\n",
            name = spec.name,
            path = spec.working_dir.display(),
        )
    }
}

impl ShortcutWriter for DesktopEntryWriter {
    fn create_shortcut(&self, spec: &ShortcutSpec) -> Result<PathBuf, UpdateError> {
        ensure_output_dir(spec)?;
        let path = spec.output_dir.join(format!("{}.desktop", spec.name));
        write_file(&path, &Self::render_entry(spec))?;
        make_executable(&path)?;
        Ok(path)
    }
}

/// Quote an `Exec` argument per the desktop entry rules; `%` is doubled
/// so it is not taken for a field code.
fn desktop_quote(arg: &str) -> String {
    let arg = arg.replace('%', "%%");
    let needs_quotes = arg.is_empty()
        || arg.chars().any(|c| c.is_whitespace() || "\"'\\><~|&;$*?#()`".contains(c));
    if !needs_quotes {
        return arg;
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '`' | '$' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Double-clickable `.command` shell scripts for Finder.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandScriptWriter;

impl CommandScriptWriter {
    pub fn render_script(spec: &ShortcutSpec) -> String {
        let mut line = format!("exec {}", shell_quote(&spec.target.display().to_string()));
        for argument in &spec.arguments {
            line.push(' ');
            line.push_str(&shell_quote(argument));
        }
        format!(
            "#!/bin/sh\ncd {} || exit 1\n{line}\n",
            shell_quote(&spec.working_dir.display().to_string())
        )
    }
}

impl ShortcutWriter for CommandScriptWriter {
    fn create_shortcut(&self, spec: &ShortcutSpec) -> Result<PathBuf, UpdateError> {
        ensure_output_dir(spec)?;
        let path = spec.output_dir.join(format!("{}.command", spec.name));
        write_file(&path, &Self::render_script(spec))?;
        make_executable(&path)?;
        Ok(path)
    }
}

fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}
