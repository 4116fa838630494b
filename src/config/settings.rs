use crate::errors::{Result, StashError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub git: GitSettings,
    #[serde(default)]
    pub stash: StashSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitSettings {
    /// Executable used for every git invocation
    pub binary: PathBuf,
    /// Extra environment passed to git
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StashSettings {
    /// Let git sign the commit re-created when a stash moves branch
    #[serde(default)]
    pub sign_moved_commits: bool,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("git"),
            environment: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| StashError::config(format!("Failed to read config file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StashError::config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;

        fs::write(path, content)
            .map_err(|e| StashError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Update a configuration value by key
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.splitn(3, '.').collect();

        match parts.as_slice() {
            ["git", "binary"] => self.git.binary = PathBuf::from(value),
            ["git", "environment", name] => {
                if value.is_empty() {
                    self.git.environment.remove(*name);
                } else {
                    self.git
                        .environment
                        .insert(name.to_string(), value.to_string());
                }
            }
            ["stash", "sign_moved_commits"] => {
                self.stash.sign_moved_commits = value
                    .parse()
                    .map_err(|_| StashError::config(format!("Invalid boolean value: {}", value)))?;
            }
            _ => return Err(StashError::config(format!("Unknown config key: {}", key))),
        }

        Ok(())
    }

    /// Get a configuration value by key
    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.splitn(3, '.').collect();

        let value = match parts.as_slice() {
            ["git", "binary"] => self.git.binary.display().to_string(),
            ["git", "environment", name] => self
                .git
                .environment
                .get(*name)
                .cloned()
                .unwrap_or_default(),
            ["stash", "sign_moved_commits"] => self.stash.sign_moved_commits.to_string(),
            _ => return Err(StashError::config(format!("Unknown config key: {}", key))),
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load_from_file(&tmp.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.git.binary, PathBuf::from("git"));
        assert!(!settings.stash.sign_moved_commits);
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut settings = Settings::default();
        settings.set_value("git.binary", "/usr/local/bin/git").unwrap();
        settings.set_value("git.environment.LC_ALL", "C").unwrap();
        settings.set_value("stash.sign_moved_commits", "true").unwrap();
        settings.save_to_file(&path).unwrap();

        let loaded = Settings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.get_value("git.environment.LC_ALL").unwrap(), "C");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "stash": { "sign_moved_commits": true } }"#).unwrap();

        let settings = Settings::load_from_file(&path).unwrap();
        assert!(settings.stash.sign_moved_commits);
        assert_eq!(settings.git.binary, PathBuf::from("git"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Settings::load_from_file(&path),
            Err(StashError::Json(_))
        ));
    }

    #[test]
    fn test_unknown_and_invalid_values() {
        let mut settings = Settings::default();
        assert!(settings.set_value("git.pager", "less").is_err());
        assert!(settings.set_value("stash.sign_moved_commits", "maybe").is_err());
        assert!(settings.get_value("stash").is_err());
    }

    #[test]
    fn test_empty_value_removes_environment_entry() {
        let mut settings = Settings::default();
        settings.set_value("git.environment.GIT_TRACE", "1").unwrap();
        settings.set_value("git.environment.GIT_TRACE", "").unwrap();
        assert!(settings.git.environment.is_empty());
    }
}
