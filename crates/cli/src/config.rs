// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Config file discovery and state directory resolution.
//!
//! Lookup order for the config file is `--config`, then `MINDER_CONFIG`,
//! then `<config_dir>/minder/config.toml`. A missing default file yields the
//! built-in defaults; a missing file that was named explicitly is an error.

use std::fs;
use std::path::{Path, PathBuf};

use minder_core::Config;

use crate::env;
use crate::error::{Error, Result};

/// Name of the config file under the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// File name of the queue database inside the state directory.
pub const QUEUE_DB_NAME: &str = "queue.db";

const APP_DIR: &str = "minder";

/// Where configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Default(PathBuf),
    BuiltIn,
}

/// Pick the config file to read, if any.
pub fn resolve_config_path(
    flag: Option<&Path>,
    env_path: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(path) = flag {
        return ConfigSource::Explicit(path.to_path_buf());
    }
    if let Some(path) = env_path {
        return ConfigSource::Explicit(path);
    }
    match config_dir {
        Some(dir) => ConfigSource::Default(dir.join(APP_DIR).join(CONFIG_FILE_NAME)),
        None => ConfigSource::BuiltIn,
    }
}

/// Load and validate the configuration for this invocation.
pub fn load(flag: Option<&Path>) -> Result<Config> {
    let source = resolve_config_path(flag, env::config_file(), dirs::config_dir());
    load_from(&source)
}

/// Load configuration from a resolved source.
pub fn load_from(source: &ConfigSource) -> Result<Config> {
    let config = match source {
        ConfigSource::Explicit(path) => parse_file(path)?,
        ConfigSource::Default(path) if path.exists() => parse_file(path)?,
        ConfigSource::Default(_) | ConfigSource::BuiltIn => Config::default(),
    };
    config.validate()?;
    Ok(config)
}

fn parse_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
}

/// Resolve the state directory.
///
/// Order: `--state-dir`, `MINDER_STATE_DIR`, `$XDG_STATE_HOME/minder`,
/// `~/.local/state/minder`.
pub fn resolve_state_dir(
    flag: Option<&Path>,
    env_dir: Option<PathBuf>,
    xdg_state_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    if let Some(dir) = env_dir {
        return dir;
    }
    if let Some(dir) = xdg_state_home {
        return dir.join(APP_DIR);
    }
    home.map(|h| h.join(".local/state").join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".local/state").join(APP_DIR))
}

/// [`resolve_state_dir`] against the process environment.
pub fn state_dir(flag: Option<&Path>) -> PathBuf {
    resolve_state_dir(flag, env::state_dir(), env::xdg_state_home(), dirs::home_dir())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
