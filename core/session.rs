use crate::config::{Config, DEFAULT_OUTPUT_DIR};
use crate::error::{AppError, Result};
use crate::export::{self, ExportResult};
use crate::tree::{TreeNode, build_tree};
use indexmap::IndexSet;
use log;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Display state of a node, derived from the selection. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    Selected,
    Partial,
    Unselected,
}

/// One loaded directory, its tree, and the set of selected paths.
///
/// Every load replaces the tree and clears the selection. A session is
/// single-owner; share it across threads behind a `Mutex`.
#[derive(Debug)]
pub struct Session {
    root: Option<PathBuf>,
    tree: Option<TreeNode>,
    selection: IndexSet<String>,
    output_dir: PathBuf,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(DEFAULT_OUTPUT_DIR)
    }
}

impl Session {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Session {
            root: None,
            tree: None,
            selection: IndexSet::new(),
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Session::new(config.export.output_dir.clone())
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    pub fn selection(&self) -> &IndexSet<String> {
        &self.selection
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn set_output_dir(&mut self, output_dir: impl Into<PathBuf>) {
        self.output_dir = output_dir.into();
    }

    /// Builds a fresh tree for `root`, replacing any previous one and clearing
    /// the selection. The previous state is kept if `root` is invalid.
    pub fn load<I, S>(&mut self, root: &Path, exclusions: I) -> Result<&TreeNode>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !root.exists() {
            return Err(AppError::InvalidPath(format!(
                "Directory does not exist: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(AppError::InvalidPath(format!(
                "Not a directory: {}",
                root.display()
            )));
        }
        let canonical = fs::canonicalize(root).map_err(|e| {
            AppError::InvalidPath(format!("Cannot resolve {}: {}", root.display(), e))
        })?;

        let exclusions: HashSet<String> = exclusions.into_iter().map(Into::into).collect();
        log::debug!("Loading {} with exclusions {:?}", canonical.display(), exclusions);

        let tree = build_tree(&canonical, &exclusions).ok_or_else(|| {
            AppError::InvalidPath(format!("Cannot read directory: {}", canonical.display()))
        })?;

        self.selection.clear();
        self.root = Some(canonical);
        Ok(&*self.tree.insert(tree))
    }

    /// Selects or deselects `path` and its whole subtree. Unknown paths are a
    /// no-op; returns whether the path resolved.
    pub fn set_selected(&mut self, path: &str, selected: bool) -> bool {
        let Some(node) = self.tree.as_ref().and_then(|tree| tree.find(path)) else {
            log::debug!("Ignoring selection of unknown path '{}'", path);
            return false;
        };

        let mut subtree = Vec::new();
        node.collect_paths(&mut subtree);
        log::debug!(
            "{} '{}' ({} paths)",
            if selected { "Selecting" } else { "Deselecting" },
            path,
            subtree.len()
        );

        if selected {
            self.selection.extend(subtree);
        } else {
            let removed: HashSet<String> = subtree.into_iter().collect();
            self.selection.retain(|p| !removed.contains(p));
        }
        true
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selection.contains(path)
    }

    /// `Partial` when some, but not all, of the subtree is selected.
    pub fn selection_state(&self, path: &str) -> Option<SelectionState> {
        let node = self.tree.as_ref()?.find(path)?;
        let mut subtree = Vec::new();
        node.collect_paths(&mut subtree);
        let selected = subtree
            .iter()
            .filter(|p| self.selection.contains(p.as_str()))
            .count();

        Some(if selected == 0 {
            SelectionState::Unselected
        } else if selected == subtree.len() {
            SelectionState::Selected
        } else {
            SelectionState::Partial
        })
    }

    /// [`SelectionState`] of every node, computed in one bottom-up pass.
    pub fn selection_states(&self) -> HashMap<String, SelectionState> {
        let mut states = HashMap::new();
        if let Some(tree) = self.tree.as_ref() {
            self.collect_states(tree, &mut states);
        }
        states
    }

    /// Returns `(selected, total)` node counts for the subtree at `node`.
    fn collect_states(
        &self,
        node: &TreeNode,
        states: &mut HashMap<String, SelectionState>,
    ) -> (usize, usize) {
        let mut selected = usize::from(self.selection.contains(&node.path));
        let mut total = 1;
        for child in node.children() {
            let (s, t) = self.collect_states(child, states);
            selected += s;
            total += t;
        }
        let state = if selected == 0 {
            SelectionState::Unselected
        } else if selected == total {
            SelectionState::Selected
        } else {
            SelectionState::Partial
        };
        states.insert(node.path.clone(), state);
        (selected, total)
    }

    /// Selected paths that resolve to files in the current tree.
    pub fn selected_file_count(&self) -> usize {
        let Some(tree) = self.tree.as_ref() else {
            return 0;
        };
        self.selection
            .iter()
            .filter(|path| tree.find(path).is_some_and(TreeNode::is_file))
            .count()
    }

    /// Text content of a file under the loaded root.
    pub fn file_content(&self, path: &str) -> Result<String> {
        let root = self.root.as_deref().ok_or(AppError::NotLoaded)?;
        let resolved = resolve_within_root(root, path)?;
        if resolved.is_dir() {
            return Err(AppError::InvalidArgument(format!(
                "'{}' is a directory",
                path
            )));
        }
        fs::read_to_string(&resolved).map_err(|e| AppError::FileRead {
            path: resolved,
            source: e,
        })
    }

    /// Writes the export for the current tree and selection.
    pub fn export(&self, custom_file_name: Option<&str>) -> Result<ExportResult> {
        if self.selection.is_empty() {
            return Err(AppError::EmptySelection);
        }
        let (Some(root), Some(tree)) = (self.root.as_deref(), self.tree.as_ref()) else {
            return Err(AppError::NotLoaded);
        };
        export::export_selection(
            tree,
            &self.selection,
            root,
            &self.output_dir,
            custom_file_name,
        )
    }
}

/// Joins `relative` onto `root`, rejecting anything that escapes it either
/// lexically (`..`, absolute paths) or through symlinks.
pub fn resolve_within_root(root: &Path, relative: &str) -> Result<PathBuf> {
    let outside = || AppError::PathOutsideRoot(relative.to_string());

    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if resolved.as_path() == root {
                    return Err(outside());
                }
                resolved.pop();
            }
            Component::RootDir | Component::Prefix(_) => return Err(outside()),
        }
    }

    if !resolved.exists() {
        return Err(AppError::NotFound(format!("File not found: {}", relative)));
    }
    let canonical = fs::canonicalize(&resolved)?;
    if !canonical.starts_with(root) {
        return Err(outside());
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/a.js"), "x").unwrap();
        fs::write(dir.path().join("src/nested/b.js"), "bb").unwrap();
        fs::write(dir.path().join("top.txt"), "top").unwrap();
        dir
    }

    fn loaded(dir: &tempfile::TempDir) -> Session {
        let mut session = Session::new(dir.path().join("out"));
        session.load(dir.path(), Vec::<String>::new()).unwrap();
        session
    }

    #[test]
    fn selecting_directory_selects_subtree_only() {
        let dir = fixture();
        let mut session = loaded(&dir);

        assert!(session.set_selected("src", true));

        let selected: Vec<&str> = session.selection().iter().map(String::as_str).collect();
        assert_eq!(selected, vec!["src", "src/a.js", "src/nested", "src/nested/b.js"]);
        assert!(!session.is_selected(""));
        assert_eq!(session.selected_file_count(), 2);
    }

    #[test]
    fn deselecting_directory_overrides_descendants() {
        let dir = fixture();
        let mut session = loaded(&dir);
        session.set_selected("", true);
        session.set_selected("src", false);

        assert!(!session.is_selected("src/nested/b.js"));
        assert!(!session.is_selected("src"));
        assert!(session.is_selected(""));
        assert!(session.is_selected("top.txt"));
        assert_eq!(session.selected_file_count(), 1);
    }

    #[test]
    fn leaf_toggle_touches_one_path() {
        let dir = fixture();
        let mut session = loaded(&dir);
        session.set_selected("src", true);
        session.set_selected("src/a.js", false);

        assert!(session.is_selected("src"));
        assert!(session.is_selected("src/nested/b.js"));
        assert!(!session.is_selected("src/a.js"));
        assert_eq!(session.selection().len(), 3);
    }

    #[test]
    fn unknown_path_is_a_no_op() {
        let dir = fixture();
        let mut session = loaded(&dir);

        assert!(!session.set_selected("does/not/exist", true));
        assert!(session.selection().is_empty());

        let mut fresh = Session::default();
        assert!(!fresh.set_selected("", true));
    }

    #[test]
    fn selection_state_reports_partial_directories() {
        let dir = fixture();
        let mut session = loaded(&dir);
        session.set_selected("src/nested", true);

        assert_eq!(session.selection_state("src"), Some(SelectionState::Partial));
        assert_eq!(
            session.selection_state("src/nested"),
            Some(SelectionState::Selected)
        );
        assert_eq!(
            session.selection_state("top.txt"),
            Some(SelectionState::Unselected)
        );
        assert_eq!(session.selection_state("missing"), None);
    }

    #[test]
    fn reload_clears_selection() {
        let dir = fixture();
        let mut session = loaded(&dir);
        session.set_selected("", true);

        session.load(dir.path(), ["src"]).unwrap();

        assert!(session.selection().is_empty());
        assert!(session.tree().unwrap().find("src").is_none());
    }

    #[test]
    fn failed_load_keeps_previous_state() {
        let dir = fixture();
        let mut session = loaded(&dir);
        session.set_selected("top.txt", true);

        let err = session
            .load(&dir.path().join("top.txt"), Vec::<String>::new())
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidPath(_)));
        assert!(session.is_selected("top.txt"));
        assert!(matches!(
            session.load(&dir.path().join("missing"), Vec::<String>::new()),
            Err(AppError::InvalidPath(_))
        ));
    }

    #[test]
    fn file_content_checks_containment() {
        let dir = fixture();
        let session = loaded(&dir);

        assert_eq!(session.file_content("src/a.js").unwrap(), "x");
        assert_eq!(session.file_content("src/nested/../a.js").unwrap(), "x");
        assert!(matches!(
            session.file_content("../outside.txt"),
            Err(AppError::PathOutsideRoot(_))
        ));
        assert!(matches!(
            session.file_content("src/../../etc/passwd"),
            Err(AppError::PathOutsideRoot(_))
        ));
        assert!(matches!(
            session.file_content("/etc/passwd"),
            Err(AppError::PathOutsideRoot(_))
        ));
        assert!(matches!(
            session.file_content("src/none.js"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            session.file_content("src"),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn file_content_rejects_symlink_escape() {
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "s3cret").unwrap();
        let dir = fixture();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
            .unwrap();
        let session = loaded(&dir);

        assert!(matches!(
            session.file_content("link.txt"),
            Err(AppError::PathOutsideRoot(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn export_never_embeds_files_outside_the_root() {
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "TOPSECRET").unwrap();
        let dir = fixture();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
            .unwrap();
        let mut session = loaded(&dir);

        assert!(session.tree().unwrap().find("link.txt").is_none());
        session.set_selected("", true);
        let result = session.export(Some("o.txt")).unwrap();
        let text = fs::read_to_string(&result.path).unwrap();

        assert!(!text.contains("TOPSECRET"));
        assert_eq!(result.file_count, 3);
    }

    #[test]
    fn selection_states_match_single_lookups() {
        let dir = fixture();
        let mut session = loaded(&dir);
        session.set_selected("src/nested", true);
        session.set_selected("top.txt", true);

        let states = session.selection_states();
        let mut paths = Vec::new();
        session.tree().unwrap().collect_paths(&mut paths);

        assert_eq!(states.len(), paths.len());
        for path in &paths {
            assert_eq!(states.get(path).copied(), session.selection_state(path), "at '{}'", path);
        }
        assert_eq!(states[""], SelectionState::Partial);
        assert_eq!(states["src/nested/b.js"], SelectionState::Selected);
        assert!(Session::default().selection_states().is_empty());
    }

    #[test]
    fn operations_before_load() {
        let session = Session::default();
        assert!(matches!(session.file_content("a"), Err(AppError::NotLoaded)));
        assert!(matches!(session.export(None), Err(AppError::EmptySelection)));
        assert_eq!(session.selected_file_count(), 0);
    }
}
