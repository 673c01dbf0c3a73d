//! `forge clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use forge::ops::{clean, CleanOptions};
use forge::util::shell::Shell;
use forge::util::GlobalContext;

pub fn execute(args: CleanArgs, shell: Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let root = ctx.find_project_root()?;

    let removed = clean(&root, CleanOptions { full: args.full }, shell)?;
    if removed.is_empty() {
        tracing::debug!("nothing to clean in {}", root.display());
    }

    Ok(())
}
