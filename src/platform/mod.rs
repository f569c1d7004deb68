//! Desktop integration: shortcuts and launching the browser after an update.

pub mod launch;
pub mod shortcut;

pub use launch::launch_detached;
pub use shortcut::{
    CommandScriptWriter, DesktopEntryWriter, ShortcutSpec, ShortcutWriter, WindowsShortcutWriter,
    create_all, native_writer, standard_shortcuts,
};

/// Where shortcuts are written: the user's desktop, else the home directory.
pub fn desktop_dir() -> Option<std::path::PathBuf> {
    dirs::desktop_dir().or_else(dirs::home_dir)
}
