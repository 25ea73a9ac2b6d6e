use crate::models::Config;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".fencecheckrc";

/// Resolve the effective configuration
///
/// An explicit `--config` path is used exclusively and must load. Otherwise
/// the first readable file from `candidate_paths` wins, then the defaults.
pub fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    for candidate in candidate_paths() {
        if !candidate.is_file() {
            continue;
        }
        match load_config_from_file(&candidate) {
            Ok(config) => {
                debug!("Using config from {}", candidate.display());
                return Ok(config);
            }
            Err(err) => debug!("Ignoring {}: {:#}", candidate.display(), err),
        }
    }

    debug!("No config file found, using defaults");
    Ok(Config::default())
}

/// Implicit config locations, most specific first: the working directory,
/// then the home directory
fn candidate_paths() -> Vec<PathBuf> {
    std::iter::once(PathBuf::from(CONFIG_FILE_NAME))
        .chain(dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME)))
        .collect()
}

/// Load config from a specific file
fn load_config_from_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Save a config to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}
