//! Test utilities and mocks for Forge unit tests.
//!
//! [`FakeToolchain`] produces MSVC-style command lines with fake program
//! names, and [`RecordingRunner`] stands in for the compiler: it records each
//! command and writes the file the command declares as its output, so the
//! staleness logic sees a real build tree.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::test_support::{build_context, exe_manifest, TestDir};
//!
//! #[test]
//! fn test_example() {
//!     let dir = TestDir::new();
//!     let root = dir.project("app", &exe_manifest("app", &[]));
//!     dir.file("app/src/main.cc", "int main() {}\n");
//!     let ctx = build_context(BuildType::Debug);
//!     // Plan and build against the fake toolchain...
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::builder::context::{BuildContext, CommandRunner, RunOutput};
use crate::builder::toolchain::{
    ArchiveInput, CommandSpec, CompileInput, Language, LinkInput, MsvcToolchain, PchLayout,
    Toolchain, ToolchainInfo, ToolchainPlatform,
};
use crate::core::project::BuildType;
use crate::util::shell::Shell;

pub use fixtures::*;

/// Toolchain with MSVC naming and flags but fake program names:
/// `fake-cc`, `fake-cxx`, `fake-link` and `fake-lib`.
#[derive(Debug, Clone)]
pub struct FakeToolchain {
    inner: MsvcToolchain,
}

impl FakeToolchain {
    pub fn new() -> Self {
        FakeToolchain {
            inner: MsvcToolchain::new(ToolchainInfo {
                platform: ToolchainPlatform::Msvc,
                cc: PathBuf::from("fake-cc"),
                cxx: PathBuf::from("fake-cxx"),
                linker: PathBuf::from("fake-link"),
                archiver: PathBuf::from("fake-lib"),
                system_include_dirs: Vec::new(),
                system_lib_dirs: Vec::new(),
            }),
        }
    }
}

impl Default for FakeToolchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolchain for FakeToolchain {
    fn info(&self) -> &ToolchainInfo {
        self.inner.info()
    }

    fn compile_command(
        &self,
        input: &CompileInput,
        lang: Language,
        build_type: BuildType,
    ) -> CommandSpec {
        let mut spec = self.inner.compile_command(input, lang, build_type);
        if lang == Language::Cxx {
            spec.program = self.info().cxx.clone();
        }
        spec
    }

    fn archive_command(&self, input: &ArchiveInput) -> CommandSpec {
        self.inner.archive_command(input)
    }

    fn link_shared_command(&self, input: &LinkInput, build_type: BuildType) -> CommandSpec {
        self.inner.link_shared_command(input, build_type)
    }

    fn link_exe_command(&self, input: &LinkInput, build_type: BuildType) -> CommandSpec {
        self.inner.link_exe_command(input, build_type)
    }

    fn pch_layout(&self, obj_dir: &Path, project_name: &str) -> PchLayout {
        self.inner.pch_layout(obj_dir, project_name)
    }

    fn object_extension(&self) -> &str {
        self.inner.object_extension()
    }

    fn static_lib_extension(&self) -> &str {
        self.inner.static_lib_extension()
    }

    fn shared_lib_extension(&self) -> &str {
        self.inner.shared_lib_extension()
    }

    fn exe_extension(&self) -> &str {
        self.inner.exe_extension()
    }

    fn lib_prefix(&self) -> &str {
        self.inner.lib_prefix()
    }

    fn import_lib_extension(&self) -> Option<&str> {
        self.inner.import_lib_extension()
    }
}

/// Command runner that records commands instead of spawning them.
///
/// Successful commands create their declared output file. A runner built
/// with [`RecordingRunner::failing_on`] fails any command with an argument
/// ending in the given name.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<CommandSpec>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    pub fn failing_on(name: impl Into<String>) -> Self {
        RecordingRunner {
            commands: Mutex::new(Vec::new()),
            fail_on: Some(name.into()),
        }
    }

    /// Every command run so far, in the order they were run.
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.commands()
            .iter()
            .map(|c| c.program.display().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec, _cwd: &Path) -> Result<RunOutput> {
        self.commands.lock().unwrap().push(spec.clone());

        if let Some(name) = &self.fail_on {
            if spec.args.iter().any(|a| a.ends_with(name.as_str())) {
                return Ok(RunOutput {
                    exit_code: 1,
                    lines: vec![format!("{}: error: fake failure", name)],
                });
            }
        }

        if let Some(output) = &spec.output {
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(output, "")?;
        }

        Ok(RunOutput::default())
    }
}

/// Quiet context on the fake toolchain with a fresh recording runner.
pub fn build_context(build_type: BuildType) -> BuildContext {
    BuildContext::new(Arc::new(FakeToolchain::new()), build_type, Shell::quiet())
        .with_runner(Arc::new(RecordingRunner::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_runner_writes_outputs() {
        let dir = TestDir::new();
        let out = dir.path().join("p/_obj/debug/a.obj");
        let spec = CommandSpec::new("fake-cc").arg("a.c").produces(&out);

        let runner = RecordingRunner::new();
        assert!(runner.run(&spec, dir.path()).unwrap().success());
        assert!(out.exists());
        assert_eq!(runner.programs(), vec!["fake-cc"]);
    }

    #[test]
    fn test_recording_runner_failure() {
        let dir = TestDir::new();
        let out = dir.path().join("b.obj");
        let spec = CommandSpec::new("fake-cc").arg("src/b.c").produces(&out);

        let runner = RecordingRunner::failing_on("b.c");
        let output = runner.run(&spec, dir.path()).unwrap();
        assert_eq!(output.exit_code, 1);
        assert!(!out.exists());
    }

    #[test]
    fn test_fake_toolchain_picks_compiler_by_language() {
        let tc = FakeToolchain::new();
        let input = CompileInput {
            source: PathBuf::from("a.cc"),
            output: PathBuf::from("a.cc.obj"),
            include_dirs: Vec::new(),
            defines: Vec::new(),
            pic: false,
            pch: None,
        };
        let cxx = tc.compile_command(&input, Language::Cxx, BuildType::Debug);
        let c = tc.compile_command(&input, Language::C, BuildType::Debug);
        assert_eq!(cxx.program, PathBuf::from("fake-cxx"));
        assert_eq!(c.program, PathBuf::from("fake-cc"));
    }
}
