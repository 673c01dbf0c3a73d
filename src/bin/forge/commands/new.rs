//! `forge new` command

use anyhow::Result;

use crate::cli::NewArgs;
use forge::core::project::AppKind;
use forge::ops::{new_project, NewOptions};
use forge::util::shell::Shell;
use forge::util::GlobalContext;

pub fn execute(args: NewArgs, shell: Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;

    let kind = if args.lib {
        AppKind::StaticLibrary
    } else if args.dll {
        AppKind::DynamicLibrary
    } else {
        AppKind::Executable
    };

    let opts = NewOptions {
        name: args.name,
        kind,
        windowed: args.windows,
        git: !args.no_git,
    };

    new_project(ctx.cwd(), &opts, shell)?;
    Ok(())
}
