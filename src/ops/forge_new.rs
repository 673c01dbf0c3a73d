//! Implementation of `forge new`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::manifest::{Manifest, MANIFEST_NAME};
use crate::core::project::AppKind;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists, write_string};
use crate::util::process::{find_executable, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Characters that may not appear in a project name.
const RESERVED_NAME_CHARS: &[char] = &[
    '/', '\\', '?', '%', '*', ':', '|', '"', '<', '>', '(', ')', '&', ';', '#', '\'',
];

/// Options for creating a new project.
#[derive(Debug, Clone)]
pub struct NewOptions {
    /// Project name, also the directory name
    pub name: String,

    pub kind: AppKind,

    /// Executables only: use the windowed subsystem
    pub windowed: bool,

    /// Initialise a git repository
    pub git: bool,
}

/// Whether `name` can be used as a project (and directory) name.
pub fn validate_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| (' '..='~').contains(&c) && !RESERVED_NAME_CHARS.contains(&c))
}

/// Create a new project in `parent/<name>` and return its root.
///
/// On failure the partly written directory is removed.
pub fn new_project(parent: &Path, opts: &NewOptions, shell: Shell) -> Result<PathBuf> {
    if !validate_name(&opts.name) {
        bail!("`{}` is an invalid name for a project", opts.name);
    }

    let root = parent.join(&opts.name);
    if root.exists() {
        bail!("destination `{}` already exists", root.display());
    }

    if let Err(e) = write_files(&root, opts) {
        if let Err(cleanup) = remove_dir_all_if_exists(&root) {
            tracing::warn!("{:#}", cleanup);
        }
        return Err(e);
    }

    if opts.git {
        init_git(&root, shell);
    }

    let description = match opts.kind {
        AppKind::Executable => "binary (application)",
        AppKind::StaticLibrary => "library",
        AppKind::DynamicLibrary => "dynamic library",
    };
    shell.status(
        Status::Created,
        format!("{} `{}` project.", description, opts.name),
    );

    Ok(root)
}

fn write_files(root: &Path, opts: &NewOptions) -> Result<()> {
    let name = &opts.name;

    ensure_dir(root)?;
    let manifest_path = root.join(MANIFEST_NAME);
    manifest(opts)
        .write(&manifest_path)
        .with_context(|| format!("cannot write `{}`", manifest_path.display()))?;

    if opts.kind == AppKind::Executable {
        write_string(
            &root.join("src/main.cc"),
            "#include <iostream>\n\
             \n\
             auto main(int argc, char** argv) -> int\n\
             {\n    std::cout << \"Hello, World!\" << std::endl;\n}\n",
        )?;
    } else {
        write_string(
            &root.join("inc").join(name).join(format!("{}.h", name)),
            "#pragma once\n\nauto hello() -> void;\n",
        )?;
        write_string(
            &root.join("src/hello.cc"),
            &format!(
                "#include <{name}/{name}.h>\n\
                 #include <iostream>\n\
                 \n\
                 auto hello() -> void\n\
                 {{\n    std::cout << \"Hello, World!\" << std::endl;\n}}\n"
            ),
        )?;
        write_string(
            &root.join("test/test_main.cc"),
            &format!(
                "#include <{name}/{name}.h>\n\
                 \n\
                 auto main() -> int\n\
                 {{\n    hello();\n    return 0;\n}}\n"
            ),
        )?;
    }

    write_string(&root.join(".gitignore"), "_*/\n")
}

fn manifest(opts: &NewOptions) -> Manifest {
    let mut manifest = Manifest::new();
    manifest.set("info.name", opts.name.as_str());
    manifest.set("info.type", opts.kind.as_str());
    if opts.kind == AppKind::Executable && opts.windowed {
        manifest.set("info.subsystem", "windows");
    }
    manifest.add_section("build");
    manifest.comment("build.libs", "");
    manifest.comment("build.pch", "");
    manifest.add_section("dependencies");
    manifest
}

/// Create the initial commit. Failures only warn.
fn init_git(root: &Path, shell: Shell) {
    let Some(git) = find_executable("git") else {
        shell.warn("git not found, skipping repository initialisation");
        return;
    };

    let steps: [&[&str]; 3] = [&["init"], &["add", "."], &["commit", "-m", "Initial commit."]];
    for args in steps {
        let cmd = ProcessBuilder::new(&git).args(args).cwd(root);
        match cmd.exec_lines() {
            Ok((0, _)) => {}
            Ok((code, lines)) => {
                tracing::debug!("{}", lines.join("\n"));
                shell.warn(format!("`{}` exited with {}", cmd.display_command(), code));
                return;
            }
            Err(e) => {
                shell.warn(format!("{:#}", e));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::Project;
    use tempfile::TempDir;

    fn opts(name: &str, kind: AppKind) -> NewOptions {
        NewOptions {
            name: name.to_string(),
            kind,
            windowed: false,
            git: false,
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("my app"));
        assert!(validate_name("gfx-2"));
        assert!(!validate_name(""));
        assert!(!validate_name("a/b"));
        assert!(!validate_name("what?"));
        assert!(!validate_name("tab\there"));
    }

    #[test]
    fn test_new_executable() {
        let tmp = TempDir::new().unwrap();
        let root = new_project(tmp.path(), &opts("app", AppKind::Executable), Shell::quiet())
            .unwrap();

        assert!(root.join("src/main.cc").exists());
        assert!(!root.join("inc").exists());
        assert_eq!(std::fs::read_to_string(root.join(".gitignore")).unwrap(), "_*/\n");

        let project = Project::load(&root).unwrap();
        assert_eq!(project.name, "app");
        assert_eq!(project.kind, AppKind::Executable);
        assert!(project.pch_header().is_none());
    }

    #[test]
    fn test_new_library() {
        let tmp = TempDir::new().unwrap();
        let root = new_project(tmp.path(), &opts("gfx", AppKind::StaticLibrary), Shell::quiet())
            .unwrap();

        assert!(root.join("inc/gfx/gfx.h").exists());
        assert!(root.join("src/hello.cc").exists());
        assert!(root.join("test/test_main.cc").exists());
        assert_eq!(Project::load(&root).unwrap().kind, AppKind::StaticLibrary);
    }

    #[test]
    fn test_windowed_subsystem() {
        let tmp = TempDir::new().unwrap();
        let mut o = opts("win", AppKind::Executable);
        o.windowed = true;
        let root = new_project(tmp.path(), &o, Shell::quiet()).unwrap();

        let text = std::fs::read_to_string(root.join("forge.ini")).unwrap();
        assert!(text.contains("subsystem = windows"));
    }

    #[test]
    fn test_existing_destination_is_left_alone() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("app")).unwrap();
        std::fs::write(tmp.path().join("app/keep.txt"), "").unwrap();

        let err = new_project(tmp.path(), &opts("app", AppKind::Executable), Shell::quiet())
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(tmp.path().join("app/keep.txt").exists());
    }

    #[test]
    fn test_invalid_name_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(new_project(tmp.path(), &opts("a|b", AppKind::Executable), Shell::quiet()).is_err());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
