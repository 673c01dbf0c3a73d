//! `forge build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use forge::ops::{build, BuildOptions};
use forge::util::shell::Shell;

pub fn execute(args: BuildArgs, shell: Shell) -> Result<()> {
    let (root, config) = super::project_context()?;

    let opts = BuildOptions {
        release: args.release,
        jobs: args.jobs,
    };

    build(&root, &config, &opts, shell)?;
    Ok(())
}
