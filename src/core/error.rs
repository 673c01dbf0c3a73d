//! Error types for workspace resolution and builds.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::manifest::ManifestError;
use crate::util::diagnostic::Diagnostic;

/// A fatal configuration problem found while resolving a workspace.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigError {
    #[error("`{}` is not a forge project (no forge.ini found)", path.display())]
    #[diagnostic(
        code(forge::config::not_a_project),
        help("Run `forge new <name>` to create a project")
    )]
    NotAProject { path: PathBuf },

    #[error("project at `{}` doesn't have a name", path.display())]
    #[diagnostic(
        code(forge::config::missing_name),
        help("Add an `info.name` entry to forge.ini")
    )]
    MissingName { path: PathBuf },

    #[error("invalid application type `{value}` (info.type) in `{}`", path.display())]
    #[diagnostic(
        code(forge::config::invalid_type),
        help("`info.type` must be one of `exe`, `lib` or `dll`")
    )]
    InvalidAppType { path: PathBuf, value: String },

    #[error("invalid subsystem type `{value}` (info.subsystem) in `{}`", path.display())]
    #[diagnostic(
        code(forge::config::invalid_subsystem),
        help("`info.subsystem` must be `console` or `windows`")
    )]
    InvalidSubsystem { path: PathBuf, value: String },

    #[error("invalid dependency declaration `{key}` in `{}`", path.display())]
    #[diagnostic(
        code(forge::config::invalid_dependency),
        help("Dependencies are declared as `local:<name> = <relative path>`")
    )]
    InvalidDependencyDeclaration { path: PathBuf, key: String },

    #[error("unknown dependency type `{scheme}` in `{}`", path.display())]
    #[diagnostic(
        code(forge::config::unknown_scheme),
        help("Only `local:<name>` dependencies are supported")
    )]
    UnknownDependencyScheme { path: PathBuf, scheme: String },

    #[error("project `{name}` cannot depend on itself")]
    #[diagnostic(
        code(forge::config::self_dependency),
        help("Check the [dependencies] section of forge.ini")
    )]
    SelfDependency { name: String, path: PathBuf },

    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    #[diagnostic(
        code(forge::config::cyclic_dependency),
        help("Remove one of the dependencies that closes the cycle")
    )]
    CyclicDependency { cycle: Vec<String> },

    #[error("dependency `{name}` points at `{}`, which does not exist", path.display())]
    #[diagnostic(code(forge::config::dependency_not_found))]
    DependencyPathNotFound { name: String, path: PathBuf },

    #[error(transparent)]
    #[diagnostic(code(forge::config::manifest))]
    Manifest(#[from] ManifestError),
}

impl ConfigError {
    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());
        if let Some(help) = miette::Diagnostic::help(self) {
            diag = diag.with_suggestion(help.to_string());
        }
        match self {
            ConfigError::NotAProject { path }
            | ConfigError::MissingName { path }
            | ConfigError::InvalidAppType { path, .. }
            | ConfigError::InvalidSubsystem { path, .. }
            | ConfigError::InvalidDependencyDeclaration { path, .. }
            | ConfigError::UnknownDependencyScheme { path, .. }
            | ConfigError::SelfDependency { path, .. }
            | ConfigError::DependencyPathNotFound { path, .. } => diag.with_location(path),
            ConfigError::CyclicDependency { .. } | ConfigError::Manifest(_) => diag,
        }
    }
}

/// A failure while building a project.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("file-system error at `{}`: {message}", path.display())]
    Filesystem { path: PathBuf, message: String },

    #[error("unable to find a usable compiler toolchain: {0}")]
    Toolchain(String),

    #[error("compilation of `{}` failed", source_file.display())]
    CompilationFailed {
        source_file: PathBuf,
        diagnostics: Vec<String>,
    },

    #[error("linking of `{}` failed", output.display())]
    LinkFailed {
        output: PathBuf,
        diagnostics: Vec<String>,
    },

    #[error("unable to generate data file for `{}`", path.display())]
    DataFile { path: PathBuf },
}

impl BuildError {
    /// Captured tool output attached to a failed compile or link.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            BuildError::CompilationFailed { diagnostics, .. }
            | BuildError::LinkFailed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}
