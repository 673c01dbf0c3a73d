//! `forge run` command

use anyhow::Result;

use crate::cli::RunArgs;
use forge::ops::{run, BuildOptions, RunOptions};
use forge::util::shell::Shell;

pub fn execute(args: RunArgs, shell: Shell) -> Result<()> {
    let (root, config) = super::project_context()?;

    let opts = RunOptions {
        build: BuildOptions {
            release: args.release,
            jobs: args.jobs,
        },
        args: args.args,
    };

    // The child's exit code is reported, not propagated.
    run(&root, &config, &opts, shell)?;
    Ok(())
}
