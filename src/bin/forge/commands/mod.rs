//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod edit;
pub mod new;
pub mod run;

use std::path::PathBuf;

use anyhow::Result;

use forge::util::config::Config;
use forge::util::GlobalContext;

/// Locate the enclosing project and its tool configuration.
pub fn project_context() -> Result<(PathBuf, Config)> {
    let ctx = GlobalContext::new()?;
    let root = ctx.find_project_root()?;
    let config = ctx.config(&root);
    Ok((root, config))
}
