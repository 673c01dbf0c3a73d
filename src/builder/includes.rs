//! Textual include dependency discovery.
//!
//! Finds the local headers a translation unit transitively includes by
//! scanning for `#include` lines. Conditional compilation and macro includes
//! are not evaluated, and headers that resolve outside the given include
//! paths (system headers) are never recorded.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::node::Node;

static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^#\s*include\s*(?:"([^"]+)"|<([^>]+)>)"#).expect("include pattern is valid")
});

/// A parsed `#include` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Include {
    /// `#include "path"`
    Quoted(String),
    /// `#include <path>`
    Angled(String),
}

impl Include {
    pub fn path(&self) -> &str {
        match self {
            Include::Quoted(p) | Include::Angled(p) => p,
        }
    }
}

/// Parse one source line as an include directive.
pub fn parse_include(line: &str) -> Option<Include> {
    let caps = INCLUDE_RE.captures(line.trim())?;
    if let Some(quoted) = caps.get(1) {
        Some(Include::Quoted(quoted.as_str().to_string()))
    } else {
        caps.get(2).map(|m| Include::Angled(m.as_str().to_string()))
    }
}

/// Populate `node.deps` with every local header its file includes,
/// directly or through other headers.
///
/// The dependency set only grows. A header already recorded is not scanned
/// again, which also terminates include cycles.
pub fn scan(node: &mut Node, include_paths: &[PathBuf]) {
    scan_file(&node.path, include_paths, &mut node.deps);
}

/// Worklist form of [`scan`] over a bare dependency set.
pub fn scan_file(path: &Path, include_paths: &[PathBuf], deps: &mut BTreeSet<PathBuf>) {
    let mut pending = vec![path.to_path_buf()];

    while let Some(file) = pending.pop() {
        for include in read_includes(&file) {
            for candidate in candidates(&file, &include, include_paths) {
                let Ok(resolved) = candidate.canonicalize() else {
                    continue;
                };
                if !resolved.is_file() || resolved == path {
                    continue;
                }
                if deps.insert(resolved.clone()) {
                    tracing::trace!("{} includes {}", file.display(), resolved.display());
                    pending.push(resolved);
                }
            }
        }
    }
}

/// Quoted includes are resolved against the including file's own folder
/// too; everything is resolved against each include path in order.
fn candidates(file: &Path, include: &Include, include_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::with_capacity(include_paths.len() + 1);
    if let (Include::Quoted(rel), Some(dir)) = (include, file.parent()) {
        out.push(dir.join(rel));
    }
    out.extend(include_paths.iter().map(|dir| dir.join(include.path())));
    out
}

fn read_includes(file: &Path) -> Vec<Include> {
    let handle = match File::open(file) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::debug!("cannot scan {}: {}", file.display(), e);
            return Vec::new();
        }
    };

    BufReader::new(handle)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| parse_include(&line))
        .collect()
}
