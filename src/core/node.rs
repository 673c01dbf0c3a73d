//! Project file tree and the source tree scanner.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Prefix reserved for generated output directories (`_obj`, `_bin`, ...).
pub const RESERVED_PREFIX: char = '_';

const SOURCE_EXTENSIONS: &[&str] = &["cc", "cpp", "cxx", "c"];
const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "inl"];

/// The role of a node in a project tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    SourceFolder,
    ApiFolder,
    TestFolder,
    DataFolder,
    SourceFile,
    HeaderFile,
    DataFile,
    PchFile,
}

impl NodeKind {
    /// Containers own children, leaves own a dependency set.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeKind::Root
                | NodeKind::SourceFolder
                | NodeKind::ApiFolder
                | NodeKind::TestFolder
                | NodeKind::DataFolder
        )
    }
}

/// One element of a project's file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Absolute path of the folder or file.
    pub path: PathBuf,
    /// Children in directory-scan order (containers only).
    pub children: Vec<Node>,
    /// Transitively included local headers (compiled leaves only).
    pub deps: BTreeSet<PathBuf>,
}

impl Node {
    pub fn new(kind: NodeKind, path: impl Into<PathBuf>) -> Self {
        Node {
            kind,
            path: path.into(),
            children: Vec::new(),
            deps: BTreeSet::new(),
        }
    }

    /// Iterate over every leaf below this node, depth first, in scan order.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }

    /// Visit every leaf mutably. Uses an explicit worklist so deep trees do
    /// not grow the call stack.
    pub fn visit_leaves_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Node),
    {
        let mut stack: Vec<&mut Node> = vec![self];
        while let Some(node) = stack.pop() {
            if node.kind.is_container() {
                stack.extend(node.children.iter_mut().rev());
            } else {
                f(node);
            }
        }
    }
}

/// Depth-first leaf iterator returned by [`Node::leaves`].
pub struct Leaves<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if node.kind.is_container() {
                self.stack.extend(node.children.iter().rev());
            } else {
                return Some(node);
            }
        }
        None
    }
}

/// Scan `path` as a folder of kind `folder`.
///
/// Missing or non-directory paths yield `None`. Entries whose name starts
/// with `.` or the reserved `_` prefix are skipped. Inside data folders
/// every file is a [`NodeKind::DataFile`]; elsewhere files are classified by
/// extension and unknown extensions are ignored.
pub fn scan_folder(path: &Path, folder: NodeKind) -> Option<Node> {
    if !path.is_dir() || is_hidden_or_reserved(path) {
        return None;
    }

    let mut node = Node::new(folder, path);

    let entries = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry in {}: {}", path.display(), e);
                None
            }
        });

    for entry in entries {
        let entry_path = entry.path();
        if is_hidden_or_reserved(entry_path) {
            continue;
        }

        if entry.file_type().is_dir() {
            if let Some(child) = scan_folder(entry_path, folder) {
                node.children.push(child);
            }
        } else if let Some(kind) = classify(entry_path, folder) {
            node.children.push(Node::new(kind, entry_path));
        }
    }

    Some(node)
}

/// Classify a file found inside a folder of kind `folder`.
pub fn classify(path: &Path, folder: NodeKind) -> Option<NodeKind> {
    if folder == NodeKind::DataFolder {
        return Some(NodeKind::DataFile);
    }

    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if SOURCE_EXTENSIONS.contains(&ext.as_str()) {
        Some(NodeKind::SourceFile)
    } else if HEADER_EXTENSIONS.contains(&ext.as_str()) {
        Some(NodeKind::HeaderFile)
    } else {
        None
    }
}

/// Whether a source file is C rather than C++.
pub fn is_c_source(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "c")
}

fn is_hidden_or_reserved(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') || n.starts_with(RESERVED_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_scan_classifies_by_extension() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("main.cc"));
        touch(&src.join("util.c"));
        touch(&src.join("util.h"));
        touch(&src.join("notes.txt"));

        let node = scan_folder(&src, NodeKind::SourceFolder).unwrap();
        let kinds: Vec<_> = node.children.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::SourceFile, NodeKind::SourceFile, NodeKind::HeaderFile]
        );
        assert!(node.children[0].path.ends_with("main.cc"));
    }

    #[test]
    fn test_scan_skips_reserved_and_hidden() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("a.cc"));
        touch(&src.join("_obj/debug/a.cc.o.cc"));
        touch(&src.join(".cache/b.cc"));
        touch(&src.join(".hidden.cc"));

        let node = scan_folder(&src, NodeKind::SourceFolder).unwrap();
        let leaves: Vec<_> = node.leaves().map(|n| n.path.clone()).collect();
        assert_eq!(leaves, vec![src.join("a.cc")]);
    }

    #[test]
    fn test_scan_recurses_into_subfolders() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("z.cc"));
        touch(&src.join("gfx/draw.cc"));
        touch(&src.join("gfx/draw.h"));

        let node = scan_folder(&src, NodeKind::SourceFolder).unwrap();
        // "gfx" sorts before "z.cc"
        assert_eq!(node.children[0].kind, NodeKind::SourceFolder);
        assert_eq!(node.children[0].children.len(), 2);

        let leaves: Vec<_> = node.leaves().map(|n| n.path.clone()).collect();
        assert_eq!(
            leaves,
            vec![src.join("gfx/draw.cc"), src.join("gfx/draw.h"), src.join("z.cc")]
        );
    }

    #[test]
    fn test_data_folder_takes_every_file() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("data");
        touch(&data.join("logo.png"));
        touch(&data.join("shaders/basic.glsl"));
        touch(&data.join(".meta"));

        let node = scan_folder(&data, NodeKind::DataFolder).unwrap();
        let leaves: Vec<_> = node.leaves().collect();
        assert_eq!(leaves.len(), 2);
        assert!(leaves.iter().all(|n| n.kind == NodeKind::DataFile));
    }

    #[test]
    fn test_missing_folder_contributes_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(scan_folder(&tmp.path().join("nope"), NodeKind::SourceFolder).is_none());

        let file = tmp.path().join("file.cc");
        touch(&file);
        assert!(scan_folder(&file, NodeKind::SourceFolder).is_none());
    }

    #[test]
    fn test_visit_leaves_mut_reaches_nested_leaves() {
        let mut root = Node::new(NodeKind::Root, "/p");
        let mut src = Node::new(NodeKind::SourceFolder, "/p/src");
        let mut sub = Node::new(NodeKind::SourceFolder, "/p/src/sub");
        sub.children.push(Node::new(NodeKind::SourceFile, "/p/src/sub/b.cc"));
        src.children.push(Node::new(NodeKind::SourceFile, "/p/src/a.cc"));
        src.children.push(sub);
        root.children.push(src);

        let mut seen = Vec::new();
        root.visit_leaves_mut(|leaf| {
            leaf.deps.insert(PathBuf::from("/p/inc/x.h"));
            seen.push(leaf.path.clone());
        });

        assert_eq!(
            seen,
            vec![PathBuf::from("/p/src/a.cc"), PathBuf::from("/p/src/sub/b.cc")]
        );
        assert!(root.leaves().all(|l| l.deps.len() == 1));
    }
}
