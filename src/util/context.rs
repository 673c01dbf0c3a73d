//! Global context for Forge operations.
//!
//! Provides centralized access to the working directory, project root
//! discovery and tool configuration.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};

use crate::core::error::ConfigError;
use crate::core::manifest::is_project_dir;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Location of the user-wide config file, resolved once.
static GLOBAL_CONFIG: LazyLock<Option<PathBuf>> = LazyLock::new(global_config_path);

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,
}

impl GlobalContext {
    /// Create a new GlobalContext for the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext { cwd }
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Find the project root by walking up from the working directory until
    /// a directory containing `forge.ini` is found.
    pub fn find_project_root(&self) -> Result<PathBuf, ConfigError> {
        find_project_root(&self.cwd)
    }

    /// Tool configuration for a project: global file merged with the
    /// project's `.forge/config.toml`.
    pub fn config(&self, project_root: &Path) -> Config {
        load_config(GLOBAL_CONFIG.as_deref(), &project_config_path(project_root))
    }
}

/// Walk up from `start` to the nearest directory holding `forge.ini`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        if is_project_dir(&current) {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ConfigError::NotAProject {
                path: start.to_path_buf(),
            });
        }
    }
}
