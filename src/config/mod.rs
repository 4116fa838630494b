pub mod settings;

pub use settings::{GitSettings, Settings, StashSettings};

use crate::errors::{Result, StashError};
use std::path::PathBuf;

/// Overrides the configuration directory
pub const CONFIG_DIR_ENV: &str = "STASHKEEP_CONFIG_DIR";

/// Get the configuration directory ($STASHKEEP_CONFIG_DIR or ~/.stashkeep/)
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let home_dir =
        dirs::home_dir().ok_or_else(|| StashError::config("Could not find home directory"))?;
    Ok(home_dir.join(".stashkeep"))
}

/// Path of the settings file
pub fn get_config_file() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.json"))
}

/// Load settings from the configuration directory, defaults if absent
pub fn load_settings() -> Result<Settings> {
    let path = get_config_file()?;
    let settings = Settings::load_from_file(&path)?;
    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}
