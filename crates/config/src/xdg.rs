//! XDG Base Directory support for livecode.

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "livecode";

/// Get the configuration directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME/livecode` or `~/.config/livecode`.
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .context("Failed to determine config directory")
}

/// Get the data directory following XDG conventions (log files live here).
///
/// Returns `$XDG_DATA_HOME/livecode` or `~/.local/share/livecode`.
pub fn get_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|p| p.join(APP_NAME))
        .context("Failed to determine data directory")
}
