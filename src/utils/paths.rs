use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the launcher configuration directory (~/.localai). Never created here;
/// the launcher only reads from it.
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".localai"))
}

/// Get the default settings file path
pub fn get_settings_file() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("launcher.yaml"))
}
