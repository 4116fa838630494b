use crate::cli::output::Output;
use crate::cli::ConfigAction;
use crate::config::{get_config_file, Settings};
use crate::errors::Result;
use std::path::Path;

/// Keys listed by `sk config list`
const KNOWN_KEYS: &[&str] = &["git.binary", "stash.sign_moved_commits"];

/// Handle configuration commands
pub fn run(action: ConfigAction) -> Result<()> {
    let config_file = get_config_file()?;

    match action {
        ConfigAction::Set { key, value } => set_config_value(&config_file, &key, &value),
        ConfigAction::Get { key } => get_config_value(&config_file, &key),
        ConfigAction::List => list_config_values(&config_file),
    }
}

fn set_config_value(config_file: &Path, key: &str, value: &str) -> Result<()> {
    let mut settings = Settings::load_from_file(config_file)?;
    settings.set_value(key, value)?;
    settings.save_to_file(config_file)?;

    Output::success(format!("Configuration updated: {key} = {value}"));
    Ok(())
}

fn get_config_value(config_file: &Path, key: &str) -> Result<()> {
    let settings = Settings::load_from_file(config_file)?;
    let value = settings.get_value(key)?;

    let display_value = if value.is_empty() {
        "(not set)".to_string()
    } else {
        value
    };

    println!("{key} = {display_value}");
    Ok(())
}

fn list_config_values(config_file: &Path) -> Result<()> {
    let settings = Settings::load_from_file(config_file)?;

    Output::section(format!("Configuration ({})", config_file.display()));
    for key in KNOWN_KEYS {
        println!("  {key} = {}", settings.get_value(key)?);
    }
    for (name, value) in &settings.git.environment {
        println!("  git.environment.{name} = {value}");
    }
    Ok(())
}
