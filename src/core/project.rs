//! Manifest-derived project model.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::error::ConfigError;
use crate::core::manifest::{is_project_dir, Manifest, MANIFEST_NAME};
use crate::core::node::{scan_folder, Node, NodeKind};
use crate::core::workspace::ProjectId;

/// Output directory for objects and generated sources.
pub const OBJ_DIR: &str = "_obj";
/// Output directory for final artifacts.
pub const BIN_DIR: &str = "_bin";
/// Output directory for IDE-facing files.
pub const MAKE_DIR: &str = "_make";

/// What a project produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppKind {
    Executable,
    StaticLibrary,
    DynamicLibrary,
}

impl AppKind {
    /// Parse the `info.type` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "exe" => Some(AppKind::Executable),
            "lib" => Some(AppKind::StaticLibrary),
            "dll" => Some(AppKind::DynamicLibrary),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppKind::Executable => "exe",
            AppKind::StaticLibrary => "lib",
            AppKind::DynamicLibrary => "dll",
        }
    }

    pub fn is_library(&self) -> bool {
        matches!(self, AppKind::StaticLibrary | AppKind::DynamicLibrary)
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Executable subsystem. Only meaningful for [`AppKind::Executable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsystemKind {
    NotApplicable,
    Console,
    Windowed,
}

/// Debug or release build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildType {
    #[default]
    Debug,
    Release,
}

impl BuildType {
    pub fn from_release(release: bool) -> Self {
        if release {
            BuildType::Release
        } else {
            BuildType::Debug
        }
    }

    /// Directory name used under `_obj` and `_bin`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            BuildType::Debug => "debug",
            BuildType::Release => "release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// A preprocessor define (`NAME` or `NAME=VALUE`).
pub type Define = (String, Option<String>);

/// Per-build-type define sets read from the platform sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defines {
    pub common: Vec<Define>,
    pub debug: Vec<Define>,
    pub release: Vec<Define>,
}

impl Defines {
    /// Read `<platform>`, `<platform>.debug` and `<platform>.release`
    /// sections for every platform section name of the host.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut defines = Defines::default();
        for platform in platform_sections() {
            defines.common.extend(read_defines(manifest, platform));
            defines
                .debug
                .extend(read_defines(manifest, &format!("{}.debug", platform)));
            defines
                .release
                .extend(read_defines(manifest, &format!("{}.release", platform)));
        }
        defines
    }

    /// Defines that apply to a build of `build_type`.
    pub fn for_build(&self, build_type: BuildType) -> Vec<Define> {
        let extra = match build_type {
            BuildType::Debug => &self.debug,
            BuildType::Release => &self.release,
        };
        self.common.iter().chain(extra.iter()).cloned().collect()
    }
}

fn read_defines(manifest: &Manifest, section: &str) -> Vec<Define> {
    manifest
        .fetch_section(section)
        .into_iter()
        .map(|(key, value)| {
            let value = if value.is_empty() { None } else { Some(value) };
            (key, value)
        })
        .collect()
}

/// Manifest sections holding defines for the host platform.
pub fn platform_sections() -> &'static [&'static str] {
    if cfg!(windows) {
        &["win32"]
    } else if cfg!(target_os = "macos") {
        &["unix", "macos"]
    } else {
        &["unix", "linux"]
    }
}

/// A `local:<name> = <path>` declaration from the `[dependencies]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDecl {
    pub name: String,
    /// Path as written, joined onto the declaring project's root.
    pub path: PathBuf,
}

/// One buildable unit described by a `forge.ini`.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: ProjectId,
    /// Canonical project root.
    pub root: PathBuf,
    pub name: String,
    pub kind: AppKind,
    pub subsystem: SubsystemKind,
    pub manifest: Manifest,
    pub root_node: Node,
    pub declarations: Vec<DependencyDecl>,
    /// Resolved dependencies, parallel to `declarations`.
    pub dependencies: Vec<ProjectId>,
    pub defines: Defines,
}

impl Project {
    /// Read the manifest at `root`, validate it and scan the source tree.
    ///
    /// Dependencies are only declared here; the workspace resolves them and
    /// assigns the project's id when it is inserted.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        if !is_project_dir(root) {
            return Err(ConfigError::NotAProject {
                path: root.to_path_buf(),
            });
        }

        let manifest = Manifest::load(&root.join(MANIFEST_NAME))?;

        let name = match manifest.try_get("info.name") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(ConfigError::MissingName {
                    path: root.to_path_buf(),
                })
            }
        };

        let type_value = manifest.get("info.type");
        let kind = AppKind::parse(type_value).ok_or_else(|| ConfigError::InvalidAppType {
            path: root.to_path_buf(),
            value: type_value.to_string(),
        })?;

        let subsystem = match kind {
            AppKind::Executable => match manifest.get("info.subsystem") {
                "windows" => SubsystemKind::Windowed,
                "console" | "" => SubsystemKind::Console,
                other => {
                    return Err(ConfigError::InvalidSubsystem {
                        path: root.to_path_buf(),
                        value: other.to_string(),
                    })
                }
            },
            _ => SubsystemKind::NotApplicable,
        };

        let declarations = parse_dependencies(&manifest, root, &name)?;
        let defines = Defines::from_manifest(&manifest);
        let root_node = scan_project(root, kind);

        tracing::debug!(
            "loaded project `{}` ({}) with {} dependencies",
            name,
            kind,
            declarations.len()
        );

        Ok(Project {
            id: ProjectId::UNASSIGNED,
            root: root.to_path_buf(),
            name,
            kind,
            subsystem,
            manifest,
            root_node,
            declarations,
            dependencies: Vec::new(),
            defines,
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_NAME)
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn inc_dir(&self) -> PathBuf {
        self.root.join("inc")
    }

    pub fn obj_dir(&self, build_type: BuildType) -> PathBuf {
        self.root.join(OBJ_DIR).join(build_type.dir_name())
    }

    pub fn bin_dir(&self, build_type: BuildType) -> PathBuf {
        self.root.join(BIN_DIR).join(build_type.dir_name())
    }

    /// Header named by `build.pch`, if any.
    pub fn pch_header(&self) -> Option<&str> {
        self.manifest.try_get("build.pch").filter(|h| !h.is_empty())
    }

    /// Extra libraries from `build.libs`.
    pub fn extra_libs(&self) -> Vec<String> {
        self.manifest
            .get("build.libs")
            .split(';')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Own include directories: `src`, and `inc` for libraries.
    pub fn own_include_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.src_dir()];
        if self.kind.is_library() {
            dirs.push(self.inc_dir());
        }
        dirs
    }
}

fn parse_dependencies(
    manifest: &Manifest,
    root: &Path,
    project_name: &str,
) -> Result<Vec<DependencyDecl>, ConfigError> {
    let mut decls = Vec::new();

    for (key, value) in manifest.fetch_section("dependencies") {
        let parts: Vec<&str> = key.split(':').collect();
        let [scheme, name] = parts.as_slice() else {
            return Err(ConfigError::InvalidDependencyDeclaration {
                path: root.to_path_buf(),
                key: key.clone(),
            });
        };

        if *scheme != "local" {
            return Err(ConfigError::UnknownDependencyScheme {
                path: root.to_path_buf(),
                scheme: scheme.to_string(),
            });
        }

        if name.is_empty() {
            return Err(ConfigError::InvalidDependencyDeclaration {
                path: root.to_path_buf(),
                key: key.clone(),
            });
        }

        if *name == project_name {
            return Err(ConfigError::SelfDependency {
                name: project_name.to_string(),
                path: root.to_path_buf(),
            });
        }

        decls.push(DependencyDecl {
            name: name.to_string(),
            path: root.join(value),
        });
    }

    Ok(decls)
}

/// Build the project's root node from its conventional folders.
fn scan_project(root: &Path, kind: AppKind) -> Node {
    let mut node = Node::new(NodeKind::Root, root);

    let mut folders = vec![("src", NodeKind::SourceFolder), ("data", NodeKind::DataFolder)];
    if kind.is_library() {
        folders.push(("inc", NodeKind::ApiFolder));
        folders.push(("test", NodeKind::TestFolder));
    }

    for (dir, folder) in folders {
        if let Some(child) = scan_folder(&root.join(dir), folder) {
            node.children.push(child);
        }
    }

    node
}
