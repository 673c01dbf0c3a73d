//! Build context - toolchain, build type and how commands are run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::builder::toolchain::{detect_toolchain, with_extension, CommandSpec, Toolchain};
use crate::core::error::BuildError;
use crate::core::project::{AppKind, BuildType, Project};
use crate::util::config::Config;
use crate::util::process::ProcessBuilder;
use crate::util::shell::{Shell, Status};

/// Exit code and captured output of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_code: i32,
    /// Standard output lines followed by standard error lines.
    pub lines: Vec<String>,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs toolchain commands. The build only talks to tools through this.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec, cwd: &Path) -> Result<RunOutput>;
}

/// Spawns real processes, capturing both streams concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, spec: &CommandSpec, cwd: &Path) -> Result<RunOutput> {
        let (exit_code, lines) = process_builder_from_spec(spec).cwd(cwd).exec_lines()?;
        Ok(RunOutput { exit_code, lines })
    }
}

pub fn process_builder_from_spec(spec: &CommandSpec) -> ProcessBuilder {
    spec.env.iter().fold(
        ProcessBuilder::new(&spec.program).args(&spec.args),
        |cmd, (key, value)| cmd.env(key, value),
    )
}

/// Everything a project build needs besides the project itself.
#[derive(Clone)]
pub struct BuildContext {
    pub build_type: BuildType,

    /// Parallel compile jobs; `None` lets rayon decide
    pub jobs: Option<usize>,

    pub shell: Shell,

    toolchain: Arc<dyn Toolchain>,

    runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("build_type", &self.build_type)
            .field("jobs", &self.jobs)
            .field("toolchain", &self.toolchain.platform())
            .finish()
    }
}

impl BuildContext {
    /// Create a context around an already constructed toolchain.
    pub fn new(toolchain: Arc<dyn Toolchain>, build_type: BuildType, shell: Shell) -> Self {
        BuildContext {
            build_type,
            jobs: None,
            shell,
            toolchain,
            runner: Arc::new(ProcessRunner),
        }
    }

    /// Detect the host toolchain from `config` and the environment.
    pub fn detect(config: &Config, build_type: BuildType, shell: Shell) -> Result<Self> {
        let toolchain = detect_toolchain(config)
            .map_err(|e| BuildError::Toolchain(format!("{:#}", e)))?;
        tracing::info!(
            "Using {} toolchain ({})",
            toolchain.platform().as_str(),
            toolchain.info().cxx.display()
        );

        let mut ctx = BuildContext::new(Arc::from(toolchain), build_type, shell);
        ctx.jobs = config.build.jobs;
        Ok(ctx)
    }

    /// Replace the command runner.
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Override the number of compile jobs.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        if jobs.is_some() {
            self.jobs = jobs;
        }
        self
    }

    /// Get the active toolchain.
    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    /// Run a tool, echoing the command line in verbose mode.
    pub fn run(&self, spec: &CommandSpec, cwd: &Path) -> Result<RunOutput> {
        tracing::debug!("running {}", spec.display());
        self.shell.verbose(Status::Running, spec.display());
        self.runner.run(spec, cwd)
    }

    /// Final artifact of `project`: `_bin/<type>/<name><ext>`.
    pub fn artifact_path(&self, project: &Project) -> PathBuf {
        let tc = self.toolchain();
        let file = match project.kind {
            AppKind::Executable => with_extension(&project.name, tc.exe_extension()),
            AppKind::StaticLibrary => with_extension(
                &format!("{}{}", tc.lib_prefix(), project.name),
                tc.static_lib_extension(),
            ),
            AppKind::DynamicLibrary => with_extension(
                &format!("{}{}", tc.lib_prefix(), project.name),
                tc.shared_lib_extension(),
            ),
        };
        project.bin_dir(self.build_type).join(file)
    }

    /// The file a dependent passes to its linker to use `project`.
    ///
    /// For a dynamic library under a toolchain that writes import libraries
    /// this is the import library, otherwise the artifact itself.
    pub fn link_file(&self, project: &Project) -> PathBuf {
        let artifact = self.artifact_path(project);
        match (project.kind, self.toolchain().import_lib_extension()) {
            (AppKind::DynamicLibrary, Some(ext)) => artifact.with_extension(ext),
            _ => artifact,
        }
    }

    /// Test executable of a library project: `_bin/<type>/<name>_test<ext>`.
    pub fn test_artifact_path(&self, project: &Project) -> PathBuf {
        let file = with_extension(
            &format!("{}_test", project.name),
            self.toolchain().exe_extension(),
        );
        project.bin_dir(self.build_type).join(file)
    }
}
