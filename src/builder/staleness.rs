//! Rebuild decisions.
//!
//! Everything here compares modification times and nothing else. The only
//! side effect is populating a node's header set through the include
//! scanner, and that only happens when the cheap checks are inconclusive.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::builder::includes;
use crate::core::node::Node;
use crate::util::fs::{is_newer, mtime};

/// Why a unit has to be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    MissingObject,
    SourceNewer,
    HeaderNewer(PathBuf),
    /// The input itself was regenerated this run.
    Regenerated,
    /// The precompiled header this unit uses is rebuilt this run.
    PrecompiledHeader,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::MissingObject => write!(f, "object file missing"),
            Reason::SourceNewer => write!(f, "source changed"),
            Reason::HeaderNewer(header) => write!(f, "`{}` changed", header.display()),
            Reason::Regenerated => write!(f, "generated source rewritten"),
            Reason::PrecompiledHeader => write!(f, "precompiled header rebuilt"),
        }
    }
}

/// Outcome for one compilable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Build(Reason),
    Skip,
}

impl Verdict {
    pub fn is_build(&self) -> bool {
        matches!(self, Verdict::Build(_))
    }
}

/// Decide from the source and object alone. `None` means the header set has
/// to be consulted.
pub fn cheap_verdict(source: &Path, object: &Path) -> Option<Verdict> {
    let Some(object_time) = mtime(object) else {
        return Some(Verdict::Build(Reason::MissingObject));
    };
    if is_newer(source, object_time) {
        return Some(Verdict::Build(Reason::SourceNewer));
    }
    None
}

/// Build if any recorded header is newer than the object.
pub fn header_verdict(deps: &BTreeSet<PathBuf>, object: &Path) -> Verdict {
    let Some(object_time) = mtime(object) else {
        return Verdict::Build(Reason::MissingObject);
    };
    match deps.iter().find(|header| is_newer(header, object_time)) {
        Some(header) => Verdict::Build(Reason::HeaderNewer(header.clone())),
        None => Verdict::Skip,
    }
}

/// Full decision for a source or PCH leaf compiled into `object`.
pub fn unit_verdict(node: &mut Node, object: &Path, include_paths: &[PathBuf]) -> Verdict {
    if let Some(verdict) = cheap_verdict(&node.path, object) {
        return verdict;
    }
    includes::scan(node, include_paths);
    header_verdict(&node.deps, object)
}

/// A data file's generated source is rewritten when it is missing or older
/// than the raw file.
pub fn data_needs_regen(raw: &Path, generated: &Path) -> bool {
    match mtime(generated) {
        Some(generated_time) => is_newer(raw, generated_time),
        None => true,
    }
}

/// The PCH wrapper is rewritten when it is missing or the manifest (which
/// names the header) changed after it was written.
pub fn pch_wrapper_needs_regen(wrapper: &Path, manifest: &Path) -> bool {
    match mtime(wrapper) {
        Some(wrapper_time) => is_newer(manifest, wrapper_time),
        None => true,
    }
}

/// Link or archive when anything was compiled, the artifact is missing or a
/// library linked into it is newer than the artifact.
pub fn needs_link(artifact: &Path, compiled: usize, libraries: &[PathBuf]) -> bool {
    let Some(artifact_time) = mtime(artifact) else {
        return true;
    };
    compiled > 0 || libraries.iter().any(|lib| is_newer(lib, artifact_time))
}
