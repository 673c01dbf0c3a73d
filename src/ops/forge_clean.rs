//! Implementation of `forge clean`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::error::BuildError;
use crate::core::node::RESERVED_PREFIX;
use crate::core::workspace::Workspace;
use crate::util::fs::prefixed_dirs;
use crate::util::shell::{Shell, Status};

/// Options for the clean command.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    /// Clean every project of the workspace, not just the requested one
    pub full: bool,
}

/// Remove the generated `_`-prefixed directories of the project at `root`
/// (or of its whole workspace). Returns the removed directories.
pub fn clean(root: &Path, opts: CleanOptions, shell: Shell) -> Result<Vec<PathBuf>> {
    let ws = Workspace::load(root)?;

    let roots: Vec<&Path> = if opts.full {
        ws.projects().iter().map(|p| p.root.as_path()).collect()
    } else {
        vec![ws.requested().root.as_path()]
    };

    let mut removed = Vec::new();
    for project_root in roots {
        for dir in prefixed_dirs(project_root, RESERVED_PREFIX)? {
            std::fs::remove_dir_all(&dir).map_err(|e| BuildError::Filesystem {
                path: dir.clone(),
                message: e.to_string(),
            })?;
            shell.status(Status::Removed, dir.display());
            removed.push(dir);
        }
    }

    Ok(removed)
}
