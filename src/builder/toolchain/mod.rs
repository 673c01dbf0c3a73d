//! Compiler families and the commands they are driven with.
//!
//! A [`Toolchain`] turns compile, archive and link requests into
//! [`CommandSpec`]s; nothing here spawns processes. Two families exist:
//! GCC-style drivers (gcc, clang, Apple clang) and MSVC.
//!
//! The tools are picked, in order, from:
//! 1. `[toolchain]` in `.forge/config.toml` or the user config
//! 2. `CC`, `CXX` and `AR` in the environment
//! 3. a `PATH` search

use std::path::{Path, PathBuf};

use crate::core::project::{BuildType, Define, SubsystemKind};

mod detect;
mod gcc;
mod msvc;

pub use detect::detect_toolchain;
pub use gcc::GccToolchain;
pub use msvc::MsvcToolchain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cxx,
}

/// One tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Extra environment, applied on top of the inherited one
    pub env: Vec<(String, String)>,
    /// File the invocation writes, if it has a single primary output
    pub output: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            output: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn produces(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Program and arguments joined by spaces, for logs and `--verbose`.
    pub fn display(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Whether a compile creates or consumes the precompiled header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PchMode {
    Create,
    Use,
}

/// Precompiled header settings for one compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PchUsage {
    pub mode: PchMode,
    /// Header as named by `build.pch`.
    pub header: String,
    /// Generated wrapper that includes the header.
    pub wrapper: PathBuf,
    /// Precompiled header file written by the create step.
    pub pch_file: PathBuf,
}

/// Where a toolchain wants the PCH wrapper and its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PchLayout {
    /// Generated wrapper translation unit or header.
    pub wrapper: PathBuf,
    /// Output of compiling the wrapper.
    pub output: PathBuf,
    /// Precompiled header consumed by the other units.
    pub pch_file: PathBuf,
    /// Whether `output` is an object that must be linked.
    pub linkable: bool,
}

/// A single translation unit to compile.
#[derive(Debug, Clone)]
pub struct CompileInput {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Project-local directories come first
    pub include_dirs: Vec<PathBuf>,
    pub defines: Vec<Define>,
    /// Position-independent code, for objects that may end up in a shared
    /// library
    pub pic: bool,
    pub pch: Option<PchUsage>,
}

/// Objects to bundle into a static library.
#[derive(Debug, Clone)]
pub struct ArchiveInput {
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Everything an executable or shared library link needs.
#[derive(Debug, Clone)]
pub struct LinkInput {
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
    /// Library files of dependency projects, dependents first
    pub lib_files: Vec<PathBuf>,
    /// Libraries linked by name (`build.libs`)
    pub libs: Vec<String>,
    pub ldflags: Vec<String>,
    pub subsystem: SubsystemKind,
    /// Language whose driver performs the link
    pub driver: Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainPlatform {
    Gcc,
    Clang,
    /// The clang shipped with Xcode
    AppleClang,
    Msvc,
}

impl ToolchainPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainPlatform::Gcc => "gcc",
            ToolchainPlatform::Clang => "clang",
            ToolchainPlatform::AppleClang => "apple-clang",
            ToolchainPlatform::Msvc => "msvc",
        }
    }
}

/// Discovered tool locations.
///
/// Constructed once per command and passed by reference; nothing about the
/// host toolchain is cached globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInfo {
    pub platform: ToolchainPlatform,
    pub cc: PathBuf,
    pub cxx: PathBuf,
    /// Linker driver
    pub linker: PathBuf,
    /// Static library archiver
    pub archiver: PathBuf,
    /// Searched after the project include directories
    pub system_include_dirs: Vec<PathBuf>,
    pub system_lib_dirs: Vec<PathBuf>,
}

/// A compiler family: command-line syntax plus file naming.
pub trait Toolchain: Send + Sync {
    fn info(&self) -> &ToolchainInfo;

    fn platform(&self) -> ToolchainPlatform {
        self.info().platform
    }

    fn compile_command(
        &self,
        input: &CompileInput,
        lang: Language,
        build_type: BuildType,
    ) -> CommandSpec;

    fn archive_command(&self, input: &ArchiveInput) -> CommandSpec;

    fn link_shared_command(&self, input: &LinkInput, build_type: BuildType) -> CommandSpec;

    fn link_exe_command(&self, input: &LinkInput, build_type: BuildType) -> CommandSpec;

    /// Where the PCH wrapper and its outputs go inside `obj_dir`.
    fn pch_layout(&self, obj_dir: &Path, project_name: &str) -> PchLayout;

    /// Flags that let an executable find shared libraries in `dirs` at run
    /// time.
    fn runtime_search_flags(&self, dirs: &[PathBuf]) -> Vec<String> {
        let _ = dirs;
        Vec::new()
    }

    /// File extensions, without the dot. An empty string means none.
    fn object_extension(&self) -> &str;
    fn static_lib_extension(&self) -> &str;
    fn shared_lib_extension(&self) -> &str;
    fn exe_extension(&self) -> &str;

    /// `lib` on Unix-like platforms.
    fn lib_prefix(&self) -> &str;

    /// Extension of the import library written next to a shared library,
    /// if the toolchain produces one.
    fn import_lib_extension(&self) -> Option<&str> {
        None
    }
}

/// Append `.ext` to a file name, leaving extension-less names untouched.
pub fn with_extension(name: &str, ext: &str) -> String {
    match ext {
        "" => name.to_string(),
        ext => format!("{}.{}", name, ext),
    }
}
