//! Configuration file support for Forge.
//!
//! Forge reads tool configuration from two locations:
//! - Global: `~/.forge/config.toml` - User-wide defaults
//! - Project: `<project>/.forge/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. The project manifest
//! (`forge.ini`) is separate and describes what to build, not how.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR: &str = ".forge";

/// Forge tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub toolchain: ToolchainSettings,
    pub build: BuildConfig,
}

/// `[toolchain]`: explicit tool paths, each overriding detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    pub cc: Option<PathBuf>,
    pub cxx: Option<PathBuf>,
    /// Static library archiver (`ar`, `llvm-ar`, `lib.exe`)
    pub ar: Option<PathBuf>,

    /// Path to the linker driver. Defaults to the C++ compiler.
    pub linker: Option<PathBuf>,
}

/// `[build]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Number of parallel compile jobs
    pub jobs: Option<usize>,
}

impl Config {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Like [`Config::load`], but a missing or broken file yields the
    /// defaults. Broken files are logged.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.is_file() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("ignoring config {}: {:#}", path.display(), e);
            Self::default()
        })
    }

    pub fn has_toolchain_overrides(&self) -> bool {
        let t = &self.toolchain;
        [&t.cc, &t.cxx, &t.ar, &t.linker].iter().any(|p| p.is_some())
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn overlay(self, other: Config) -> Config {
        Config {
            toolchain: ToolchainSettings {
                cc: other.toolchain.cc.or(self.toolchain.cc),
                cxx: other.toolchain.cxx.or(self.toolchain.cxx),
                ar: other.toolchain.ar.or(self.toolchain.ar),
                linker: other.toolchain.linker.or(self.toolchain.linker),
            },
            build: BuildConfig {
                jobs: other.build.jobs.or(self.build.jobs),
            },
        }
    }
}

/// Defaults, overlaid with the user config, overlaid with the project config.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let global = global_path.map(Config::load_or_default).unwrap_or_default();
    Config::default()
        .overlay(global)
        .overlay(Config::load_or_default(project_path))
}

/// Get the global forge config directory (`~/.forge`).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

/// Get the global config path (`~/.forge/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (`<project>/.forge/config.toml`).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.toml")
}
