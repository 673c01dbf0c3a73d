//! Implementation of `forge run`.

use std::path::Path;

use anyhow::{bail, Result};

use crate::core::project::AppKind;
use crate::ops::forge_build::{build_session, open_session, BuildOptions, Session};
use crate::util::config::Config;
use crate::util::diagnostic::suggestions;
use crate::util::fs::relative_path;
use crate::util::process::ProcessBuilder;
use crate::util::shell::{Shell, Status};

/// Options for the run command.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub build: BuildOptions,

    /// Parameters passed to the executable
    pub args: Vec<String>,
}

/// Build the project at `root`, then run its executable.
///
/// Returns the child's exit code. The command itself succeeds whatever that
/// code is; it is reported with the `Ended` status.
pub fn run(root: &Path, config: &Config, opts: &RunOptions, shell: Shell) -> Result<i32> {
    let mut session = open_session(root, config, &opts.build, shell)?;
    ensure_runnable(&session)?;
    build_session(&mut session)?;
    run_session(&session, &opts.args)
}

fn ensure_runnable(session: &Session) -> Result<()> {
    let project = session.workspace.requested();
    if project.kind != AppKind::Executable {
        bail!(
            "`{}` is not an application project and cannot be run\n\nhelp: {}",
            project.name,
            suggestions::NOT_RUNNABLE
        );
    }
    Ok(())
}

/// Run the built executable of the requested project.
pub fn run_session(session: &Session, args: &[String]) -> Result<i32> {
    let ctx = session.context();
    let project = session.workspace.requested();
    let exe = ctx.artifact_path(project);
    if !exe.is_file() {
        bail!("unable to locate `{}`", exe.display());
    }

    ctx.shell.status(
        Status::Running,
        format!("`{}`", relative_path(&project.root, &exe).display()),
    );
    tracing::debug!("running {} with {:?}", exe.display(), args);

    let status = ProcessBuilder::new(&exe)
        .args(args)
        .cwd(&project.root)
        .status()?;
    let code = status.code().unwrap_or(-1);

    ctx.shell.status(Status::Ended, format!("Exit code: {}", code));
    Ok(code)
}
