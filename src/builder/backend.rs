//! Build backends.
//!
//! A backend turns a resolved workspace into something: artifacts, IDE
//! files, a launched editor. Only the direct toolchain backend exists; IDE
//! project generators would implement the same trait.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::builder::compile_commands::emit_compile_commands;
use crate::builder::context::BuildContext;
use crate::builder::native::NativeBuilder;
use crate::builder::plan::ProjectPlan;
use crate::core::project::MAKE_DIR;
use crate::core::workspace::Workspace;
use crate::util::process::{find_executable, ProcessBuilder};
use crate::util::shell::Status;

/// Environment variable naming the editor `forge edit` launches.
pub const EDITOR_ENV: &str = "FORGE_EDITOR";

const DEFAULT_EDITOR: &str = "code";

/// Result of a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// At least one project compiled or linked something
    Success,
    /// Every project was already up to date
    NoWork,
}

pub trait Backend {
    /// Whether the tools this backend drives can be found.
    fn is_available(&self) -> bool;

    /// Write IDE-facing files for the workspace and return their paths.
    fn generate_workspace_files(&self, ws: &mut Workspace) -> Result<Vec<PathBuf>>;

    /// Open the workspace in the backend's external tool.
    fn launch_external_tool(&self, ws: &Workspace) -> Result<()>;

    /// Build every project the requested project needs, dependencies first.
    fn build(&self, ws: &mut Workspace) -> Result<BuildState>;
}

/// Compiles and links directly with the detected toolchain.
#[derive(Debug)]
pub struct DirectToolchainBackend {
    ctx: BuildContext,
}

impl DirectToolchainBackend {
    pub fn new(ctx: BuildContext) -> Self {
        DirectToolchainBackend { ctx }
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Plans for every project in build order.
    fn plans(&self, ws: &mut Workspace) -> Result<Vec<ProjectPlan>> {
        let order = ws.build_order(ws.requested_id())?;
        order
            .into_iter()
            .map(|id| ProjectPlan::for_project(ws, id, &self.ctx))
            .collect()
    }

    fn editor(&self) -> Option<PathBuf> {
        let name = std::env::var(EDITOR_ENV)
            .ok()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        find_executable(&name)
    }
}

impl Backend for DirectToolchainBackend {
    fn is_available(&self) -> bool {
        let info = self.ctx.toolchain().info();
        [&info.cc, &info.cxx, &info.archiver, &info.linker]
            .iter()
            .all(|tool| tool.is_file() || find_executable(&tool.to_string_lossy()).is_some())
    }

    fn generate_workspace_files(&self, ws: &mut Workspace) -> Result<Vec<PathBuf>> {
        let plans = self.plans(ws)?;
        let path = ws.requested().root.join(MAKE_DIR).join("compile_commands.json");
        self.ctx
            .shell
            .status(Status::Generating, format!("Writing `{}`.", path.display()));
        emit_compile_commands(&self.ctx, &plans, &path)?;
        Ok(vec![path])
    }

    fn launch_external_tool(&self, ws: &Workspace) -> Result<()> {
        let Some(editor) = self.editor() else {
            bail!(
                "no editor found; set {} or put `{}` on PATH",
                EDITOR_ENV,
                DEFAULT_EDITOR
            );
        };

        let root = &ws.requested().root;
        self.ctx
            .shell
            .status(Status::Running, format!("`{}`", editor.display()));
        let status = ProcessBuilder::new(&editor).arg(root).cwd(root).status()?;
        if !status.success() {
            bail!("`{}` exited with {}", editor.display(), status);
        }
        Ok(())
    }

    fn build(&self, ws: &mut Workspace) -> Result<BuildState> {
        let order = ws.build_order(ws.requested_id())?;
        let builder = NativeBuilder::new(&self.ctx);
        let mut did_work = false;

        for id in order {
            self.ctx
                .shell
                .status(Status::Building, building_message(&ws.project(id).name));
            let plan = ProjectPlan::for_project(ws, id, &self.ctx)?;
            let outcome = builder.execute(&plan)?;
            tracing::debug!(
                "`{}`: {} compiled, linked: {}",
                plan.name,
                outcome.compiled,
                outcome.linked
            );
            did_work |= outcome.did_work();
        }

        Ok(if did_work {
            BuildState::Success
        } else {
            BuildState::NoWork
        })
    }
}

/// Message of the `Building` status line for one project.
fn building_message(name: &str) -> String {
    format!("project `{}`", name)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::project::BuildType;
    use crate::test_support::{
        exe_manifest, lib_manifest, set_mtime, FakeToolchain, RecordingRunner, TestDir,
    };
    use crate::util::shell::{ColorChoice, Shell, Verbosity};

    fn backend(runner: Arc<RecordingRunner>) -> DirectToolchainBackend {
        DirectToolchainBackend::new(
            BuildContext::new(Arc::new(FakeToolchain::new()), BuildType::Debug, Shell::quiet())
                .with_runner(runner),
        )
    }

    #[test]
    fn test_building_status_names_the_project_once() {
        let shell = Shell::new(Verbosity::Normal, ColorChoice::Never);
        assert_eq!(
            shell.status_line(Status::Building, building_message("gfx")),
            "    Building project `gfx`"
        );
    }

    #[test]
    fn test_dependencies_build_first_then_no_work() {
        let dir = TestDir::new();
        let root = dir.project("app", &exe_manifest("app", &[("base", "../base")]));
        dir.project("base", &lib_manifest("base", &[]));
        dir.file("app/src/main.cc", "#include <base/base.h>\n");
        dir.file("base/src/base.cc", "");
        dir.file("base/inc/base/base.h", "");

        let runner = Arc::new(RecordingRunner::new());
        let backend = backend(runner.clone());

        let mut ws = Workspace::load(&root).unwrap();
        assert_eq!(backend.build(&mut ws).unwrap(), BuildState::Success);
        assert_eq!(
            runner.programs(),
            vec!["fake-cxx", "fake-lib", "fake-cxx", "fake-link"]
        );

        runner.clear();
        let mut ws = Workspace::load(&root).unwrap();
        assert_eq!(backend.build(&mut ws).unwrap(), BuildState::NoWork);
        assert!(runner.programs().is_empty());
    }

    #[test]
    fn test_touched_library_header_rebuilds_dependent_only() {
        let dir = TestDir::new();
        let root = dir.project("app", &exe_manifest("app", &[("base", "../base")]));
        dir.project("base", &lib_manifest("base", &[]));
        let main = dir.file("app/src/main.cc", "#include <base/base.h>\n");
        let other = dir.file("app/src/other.cc", "");
        let base_src = dir.file("base/src/base.cc", "");
        let header = dir.file("base/inc/base/base.h", "");

        let runner = Arc::new(RecordingRunner::new());
        let backend = backend(runner.clone());
        let mut ws = Workspace::load(&root).unwrap();
        backend.build(&mut ws).unwrap();

        for path in [&main, &other, &base_src, &header] {
            set_mtime(path, 100);
        }
        for obj in [
            "app/_obj/debug/src/main.cc.obj",
            "app/_obj/debug/src/other.cc.obj",
            "base/_obj/debug/src/base.cc.obj",
        ] {
            set_mtime(&dir.path().join(obj), 200);
        }
        set_mtime(&dir.path().join("base/_bin/debug/base.lib"), 300);
        set_mtime(&dir.path().join("app/_bin/debug/app.exe"), 300);
        set_mtime(&header, 250);

        runner.clear();
        let mut ws = Workspace::load(&root).unwrap();
        assert_eq!(backend.build(&mut ws).unwrap(), BuildState::Success);

        let commands = runner.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].args.iter().any(|a| a.ends_with("main.cc")));
        assert_eq!(commands[1].program, PathBuf::from("fake-link"));
    }

    #[test]
    fn test_generate_writes_compile_commands() {
        let dir = TestDir::new();
        let root = dir.project("app", &exe_manifest("app", &[]));
        dir.file("app/src/main.cc", "");

        let backend = backend(Arc::new(RecordingRunner::new()));
        let mut ws = Workspace::load(&root).unwrap();
        let files = backend.generate_workspace_files(&mut ws).unwrap();

        assert_eq!(files, vec![ws.root().join("_make/compile_commands.json")]);
        assert!(files[0].exists());
    }
}
