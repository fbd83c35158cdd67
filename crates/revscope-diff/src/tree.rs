//! File tree reconstruction.
//!
//! The backend lists a version's files as flat relative paths. [`build`]
//! folds them into a nested tree whose traversal order is fixed (directories
//! first, then by name) no matter what order the paths arrive in.
//!
//! When the same path is used both as a file and as a directory prefix
//! (`src` and `src/lib.rs`), the directory wins: the node is a directory and
//! keeps its children.

use std::collections::BTreeMap;

use revscope_util::path::path_segments;
use serde::{Deserialize, Serialize};

/// A node in a version's file tree. The root has an empty name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeNode {
    pub name: String,
    pub is_file: bool,
    children: BTreeMap<String, FileTreeNode>,
}

/// One line of a flattened tree, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRow {
    /// Nesting depth; top-level entries are 0.
    pub depth: usize,
    pub name: String,
    /// Full relative path of the node.
    pub path: String,
    pub is_file: bool,
}

/// Build a tree from relative paths.
pub fn build<I, S>(paths: I) -> FileTreeNode
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut root = FileTreeNode::directory("");
    for path in paths {
        root.insert(path.as_ref());
    }
    root
}

impl FileTreeNode {
    fn directory(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            is_file: false,
            children: BTreeMap::new(),
        }
    }

    fn file(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            is_file: true,
            children: BTreeMap::new(),
        }
    }

    fn insert(&mut self, path: &str) {
        let segments = path_segments(path);
        let Some((leaf, dirs)) = segments.split_last() else {
            return;
        };

        let mut node = self;
        for dir in dirs {
            node = node
                .children
                .entry((*dir).to_owned())
                .or_insert_with(|| FileTreeNode::directory(dir));
            node.is_file = false;
        }

        node.children
            .entry((*leaf).to_owned())
            .or_insert_with(|| FileTreeNode::file(leaf));
    }

    /// Children in display order: directories first, then files, each by name.
    pub fn children(&self) -> impl Iterator<Item = &FileTreeNode> + '_ {
        let dirs = self.children.values().filter(|c| !c.is_file);
        let files = self.children.values().filter(|c| c.is_file);
        dirs.chain(files)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of files anywhere below this node.
    pub fn file_count(&self) -> usize {
        self.children
            .values()
            .map(|c| if c.is_file { 1 } else { c.file_count() })
            .sum()
    }

    /// Find a node by its path relative to this one.
    pub fn find(&self, path: &str) -> Option<&FileTreeNode> {
        path_segments(path)
            .into_iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    /// Flatten the tree into display rows (depth-first, display order).
    pub fn rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        self.push_rows("", 0, &mut rows);
        rows
    }

    fn push_rows(&self, prefix: &str, depth: usize, rows: &mut Vec<TreeRow>) {
        for child in self.children() {
            let path = if prefix.is_empty() {
                child.name.clone()
            } else {
                format!("{prefix}/{}", child.name)
            };
            rows.push(TreeRow {
                depth,
                name: child.name.clone(),
                path: path.clone(),
                is_file: child.is_file,
            });
            child.push_rows(&path, depth + 1, rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_paths(tree: &FileTreeNode) -> Vec<String> {
        tree.rows().into_iter().map(|r| r.path).collect()
    }

    #[test]
    fn test_build_nested_tree() {
        let tree = build(["src/main.rs", "src/lib.rs", "Cargo.toml", "src/ui/app.rs"]);

        assert_eq!(tree.name, "");
        assert!(!tree.is_file);
        assert_eq!(tree.file_count(), 4);

        let src = tree.find("src").unwrap();
        assert!(!src.is_file);
        assert!(tree.find("src/ui/app.rs").unwrap().is_file);
        assert!(tree.find("src/missing.rs").is_none());
    }

    #[test]
    fn test_directories_before_files_then_by_name() {
        let tree = build(["zeta.txt", "alpha.txt", "src/b.rs", "docs/a.md", "src/a/x.rs"]);
        assert_eq!(
            row_paths(&tree),
            vec![
                "docs",
                "docs/a.md",
                "src",
                "src/a",
                "src/a/x.rs",
                "src/b.rs",
                "alpha.txt",
                "zeta.txt",
            ]
        );
    }

    #[test]
    fn test_rows_carry_depth() {
        let tree = build(["a/b/c.txt"]);
        let depths: Vec<(usize, bool)> = tree.rows().iter().map(|r| (r.depth, r.is_file)).collect();
        assert_eq!(depths, vec![(0, false), (1, false), (2, true)]);
    }

    #[test]
    fn test_permutation_invariance() {
        let paths = ["b/x.rs", "a.rs", "b/c/d.rs", "b/a.rs", "c", "a/z.rs"];
        let expected = build(paths);

        // Every rotation and the reverse must produce the same tree.
        for shift in 0..paths.len() {
            let mut rotated = paths.to_vec();
            rotated.rotate_left(shift);
            assert_eq!(build(&rotated), expected);
            rotated.reverse();
            assert_eq!(build(&rotated), expected);
        }
    }

    #[test]
    fn test_directory_wins_on_collision() {
        let leaf_first = build(["src", "src/lib.rs"]);
        let dir_first = build(["src/lib.rs", "src"]);

        assert_eq!(leaf_first, dir_first);
        let src = leaf_first.find("src").unwrap();
        assert!(!src.is_file);
        assert_eq!(src.file_count(), 1);
    }

    #[test]
    fn test_paths_are_normalised() {
        let tree = build(["./src//lib.rs", "/src/lib.rs/", "", "src/./main.rs"]);
        assert_eq!(row_paths(&tree), vec!["src", "src/lib.rs", "src/main.rs"]);
    }

    #[test]
    fn test_empty_input() {
        let tree = build(Vec::<String>::new());
        assert!(tree.is_empty());
        assert!(tree.rows().is_empty());
        assert_eq!(tree.file_count(), 0);
    }
}
