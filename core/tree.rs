use crate::error::AppError;
use crate::output_formats::format_size;
use log;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub name: String,
    /// Relative to the loaded root, '/'-separated. The root itself is "".
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub size: u64,
    pub formatted_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn file(name: String, path: String, size: u64) -> Self {
        TreeNode {
            name,
            path,
            node_type: NodeType::File,
            size,
            formatted_size: format_size(size),
            children: None,
        }
    }

    /// Directory node whose size is the sum of `children`.
    pub fn directory(name: String, path: String, children: Vec<TreeNode>) -> Self {
        let size = children.iter().map(|c| c.size).sum();
        TreeNode {
            name,
            path,
            node_type: NodeType::Directory,
            size,
            formatted_size: format_size(size),
            children: Some(children),
        }
    }

    pub fn is_file(&self) -> bool {
        self.node_type == NodeType::File
    }

    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }

    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Looks up a node by its relative path, descending one name per segment.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if path.is_empty() {
            return Some(self);
        }
        let mut current = self;
        for segment in path.split('/') {
            current = current.children().iter().find(|c| c.name == segment)?;
        }
        Some(current)
    }

    /// Pushes the path of this node and of every descendant, pre-order.
    pub fn collect_paths(&self, out: &mut Vec<String>) {
        out.push(self.path.clone());
        for child in self.children() {
            child.collect_paths(out);
        }
    }

    pub fn file_count(&self) -> usize {
        match self.node_type {
            NodeType::File => 1,
            NodeType::Directory => self.children().iter().map(TreeNode::file_count).sum(),
        }
    }
}

/// Builds the tree rooted at `root`, pruning every entry whose base name is in
/// `exclusions`. The root itself is never excluded.
///
/// Returns `None` only when `root` is not a directory that can be stat'ed.
/// Directories that cannot be enumerated are logged and kept with no children.
pub fn build_tree(root: &Path, exclusions: &HashSet<String>) -> Option<TreeNode> {
    match fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            log::warn!("Not a directory: {}", root.display());
            return None;
        }
        Err(e) => {
            log::warn!("Cannot access {}: {}", root.display(), e);
            return None;
        }
    }

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    log::info!(
        "Building tree for {} ({} exclusions)",
        root.display(),
        exclusions.len()
    );
    let walk = TreeWalk {
        root: fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf()),
        exclusions,
    };
    let tree = walk.directory(root, name, String::new());
    log::info!(
        "Tree built: {} files, {}",
        tree.file_count(),
        tree.formatted_size
    );
    Some(tree)
}

struct TreeWalk<'a> {
    /// Canonical root; file links must resolve below it.
    root: PathBuf,
    exclusions: &'a HashSet<String>,
}

impl TreeWalk<'_> {
    fn directory(&self, abs_path: &Path, name: String, rel_path: String) -> TreeNode {
        let walker = WalkDir::new(abs_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut children = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("{}", AppError::from(e));
                    continue;
                }
            };

            // Relative paths must round-trip, so lossy names are not listed.
            let Some(entry_name) = entry.file_name().to_str().map(str::to_string) else {
                log::debug!("Skipping non UTF-8 name: {}", entry.path().display());
                continue;
            };
            if self.exclusions.contains(&entry_name) {
                log::trace!("Excluded: {}", entry.path().display());
                continue;
            }

            let child_path = join_relative(&rel_path, &entry_name);
            if let Some(child) = self.entry(&entry, entry_name, child_path) {
                children.push(child);
            }
        }

        TreeNode::directory(name, rel_path, children)
    }

    fn entry(&self, entry: &DirEntry, name: String, rel_path: String) -> Option<TreeNode> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return Some(self.directory(entry.path(), name, rel_path));
        }

        if file_type.is_file() {
            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    log::warn!("Cannot read size of {}: {}", entry.path().display(), e);
                    0
                }
            };
            return Some(TreeNode::file(name, rel_path, size));
        }

        if file_type.is_symlink() {
            return self.file_link(entry, name, rel_path);
        }

        log::trace!("Skipping special file: {}", entry.path().display());
        None
    }

    /// Links are never followed into directories, and only listed when the
    /// target file lives under the root.
    fn file_link(&self, entry: &DirEntry, name: String, rel_path: String) -> Option<TreeNode> {
        let target = match fs::canonicalize(entry.path()) {
            Ok(target) => target,
            Err(e) => {
                log::debug!("Skipping dangling link {}: {}", entry.path().display(), e);
                return None;
            }
        };
        if !target.starts_with(&self.root) {
            log::warn!(
                "Skipping link pointing outside the root: {} -> {}",
                entry.path().display(),
                target.display()
            );
            return None;
        }
        match fs::metadata(&target) {
            Ok(metadata) if metadata.is_file() => {
                Some(TreeNode::file(name, rel_path, metadata.len()))
            }
            Ok(_) => {
                log::debug!("Skipping link to directory: {}", entry.path().display());
                None
            }
            Err(e) => {
                log::debug!("Skipping unreadable link {}: {}", entry.path().display(), e);
                None
            }
        }
    }
}

fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
