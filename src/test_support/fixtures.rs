//! Test fixtures: temporary project trees and manifest generators.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use tempfile::TempDir;

/// A temporary directory holding one or more projects.
///
/// The path is canonical so it compares equal to the roots a workspace
/// resolves.
pub struct TestDir {
    _tmp: TempDir,
    path: PathBuf,
}

impl TestDir {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let path = tmp.path().canonicalize().expect("temp dir has a canonical path");
        TestDir { _tmp: tmp, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create `<name>/forge.ini` with `manifest` and return the project root.
    pub fn project(&self, name: &str, manifest: &str) -> PathBuf {
        let root = self.path.join(name);
        std::fs::create_dir_all(&root).expect("failed to create project dir");
        std::fs::write(root.join("forge.ini"), manifest).expect("failed to write manifest");
        root
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, content).expect("failed to write file");
        path
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Set the modification time of `path` to `secs` after the epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    let file = File::options()
        .write(true)
        .open(path)
        .unwrap_or_else(|e| panic!("cannot open {}: {}", path.display(), e));
    file.set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap_or_else(|e| panic!("cannot set mtime of {}: {}", path.display(), e));
}

fn manifest(name: &str, kind: &str, deps: &[(&str, &str)]) -> String {
    let mut manifest = format!("[info]\nname = {}\ntype = {}\n", name, kind);
    if !deps.is_empty() {
        manifest.push_str("\n[dependencies]\n");
        for (dep, path) in deps {
            manifest.push_str(&format!("local:{} = {}\n", dep, path));
        }
    }
    manifest
}

/// Manifest of an executable project with `local:` dependencies.
pub fn exe_manifest(name: &str, deps: &[(&str, &str)]) -> String {
    manifest(name, "exe", deps)
}

/// Manifest of a static library project.
pub fn lib_manifest(name: &str, deps: &[(&str, &str)]) -> String {
    manifest(name, "lib", deps)
}

/// Manifest of a dynamic library project.
pub fn dll_manifest(name: &str, deps: &[(&str, &str)]) -> String {
    manifest(name, "dll", deps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_layout() {
        assert_eq!(
            lib_manifest("gfx", &[("base", "../base")]),
            "[info]\nname = gfx\ntype = lib\n\n[dependencies]\nlocal:base = ../base\n"
        );
        assert_eq!(exe_manifest("app", &[]), "[info]\nname = app\ntype = exe\n");
    }

    #[test]
    fn test_set_mtime() {
        let dir = TestDir::new();
        let file = dir.file("a.txt", "");
        set_mtime(&file, 42);
        let modified = std::fs::metadata(&file).unwrap().modified().unwrap();
        assert_eq!(modified, UNIX_EPOCH + Duration::from_secs(42));
    }
}
