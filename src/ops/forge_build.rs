//! Implementation of `forge build`.

use std::path::Path;

use anyhow::Result;

use crate::builder::backend::{Backend, BuildState, DirectToolchainBackend};
use crate::builder::context::BuildContext;
use crate::core::error::BuildError;
use crate::core::project::BuildType;
use crate::core::workspace::Workspace;
use crate::util::config::Config;
use crate::util::shell::{Shell, Status};

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Build in release mode
    pub release: bool,

    /// Number of parallel jobs (overrides `build.jobs`)
    pub jobs: Option<usize>,
}

impl BuildOptions {
    pub fn build_type(&self) -> BuildType {
        BuildType::from_release(self.release)
    }
}

/// A resolved workspace and the backend that builds it.
#[derive(Debug)]
pub struct Session {
    pub workspace: Workspace,
    pub backend: DirectToolchainBackend,
}

impl Session {
    pub fn context(&self) -> &BuildContext {
        self.backend.context()
    }
}

/// Resolve the workspace at `root`, then detect the toolchain.
///
/// Configuration errors are reported before any toolchain lookup happens.
pub fn open_session(
    root: &Path,
    config: &Config,
    opts: &BuildOptions,
    shell: Shell,
) -> Result<Session> {
    let workspace = Workspace::load(root)?;

    let ctx = BuildContext::detect(config, opts.build_type(), shell)?.with_jobs(opts.jobs);
    let backend = DirectToolchainBackend::new(ctx);
    if !backend.is_available() {
        let info = backend.context().toolchain().info();
        return Err(BuildError::Toolchain(format!(
            "`{}` or one of its tools cannot be executed",
            info.cxx.display()
        ))
        .into());
    }

    Ok(Session { workspace, backend })
}

/// Build the project at `root` and everything it depends on.
pub fn build(root: &Path, config: &Config, opts: &BuildOptions, shell: Shell) -> Result<Session> {
    let mut session = open_session(root, config, opts, shell)?;
    build_session(&mut session)?;
    Ok(session)
}

/// Build an already opened session and report the result.
pub fn build_session(session: &mut Session) -> Result<BuildState> {
    let state = session.backend.build(&mut session.workspace)?;

    let shell = session.context().shell;
    match state {
        BuildState::Success => shell.status(
            Status::Finished,
            format!("`{}` built.", session.workspace.requested().name),
        ),
        BuildState::NoWork => shell.status(Status::Finished, "Already up to date."),
    }

    Ok(state)
}

#[cfg(test)]
pub(crate) fn test_session(
    root: &Path,
    runner: std::sync::Arc<crate::test_support::RecordingRunner>,
) -> Session {
    use std::sync::Arc;

    use crate::test_support::FakeToolchain;

    let ctx = BuildContext::new(Arc::new(FakeToolchain::new()), BuildType::Debug, Shell::quiet())
        .with_runner(runner);
    Session {
        workspace: Workspace::load(root).unwrap(),
        backend: DirectToolchainBackend::new(ctx),
    }
}
