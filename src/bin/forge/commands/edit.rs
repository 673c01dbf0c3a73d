//! `forge edit` command

use anyhow::Result;

use crate::cli::EditArgs;
use forge::ops::{edit, EditOptions};
use forge::util::shell::Shell;

pub fn execute(args: EditArgs, shell: Shell) -> Result<()> {
    let (root, config) = super::project_context()?;

    let opts = EditOptions {
        generate_only: args.generate_only,
    };
    edit(&root, &config, opts, shell)?;

    Ok(())
}
