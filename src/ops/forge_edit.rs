//! Implementation of `forge edit`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::backend::Backend;
use crate::ops::forge_build::{open_session, BuildOptions, Session};
use crate::util::config::Config;
use crate::util::shell::Shell;

/// Options for the edit command.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditOptions {
    /// Only generate the IDE files
    pub generate_only: bool,
}

/// Generate IDE files for the workspace at `root` and, unless
/// `generate_only` is set, open it in the editor.
pub fn edit(root: &Path, config: &Config, opts: EditOptions, shell: Shell) -> Result<Vec<PathBuf>> {
    let mut session = open_session(root, config, &BuildOptions::default(), shell)?;
    edit_session(&mut session, opts)
}

pub fn edit_session(session: &mut Session, opts: EditOptions) -> Result<Vec<PathBuf>> {
    let files = session
        .backend
        .generate_workspace_files(&mut session.workspace)?;

    if !opts.generate_only {
        session.backend.launch_external_tool(&session.workspace)?;
    }

    Ok(files)
}
