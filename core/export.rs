use crate::error::{AppError, Result};
use crate::session::resolve_within_root;
use crate::tree::TreeNode;
use chrono::{DateTime, Local};
use indexmap::IndexSet;
use log;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const TREE_SECTION_HEADER: &str = "=== DIRECTORY TREE ===";
pub const CONTENT_SECTION_HEADER: &str = "=== FILE CONTENTS ===";
pub const NOTHING_EXPORTED_NOTICE: &str = "(No file contents were exported.)";

const SELECTED_MARK: &str = "[x]";
const UNSELECTED_MARK: &str = "[ ]";
const DIRECTORY_ICON: &str = "📁";
const FILE_ICON: &str = "📄";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub path: PathBuf,
    pub directory: PathBuf,
    pub file_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub text: String,
    /// Files whose content was embedded; unreadable files are not counted.
    pub file_count: usize,
}

/// Box-drawing outline of `tree`; `marker` supplies the checkbox for each node.
pub fn render_outline<F>(tree: &TreeNode, marker: F) -> String
where
    F: Fn(&TreeNode) -> &'static str,
{
    let mut out = String::new();
    render_node(tree, "", true, true, &marker, &mut out);
    out
}

/// Outline marking exactly the paths present in `selection`.
pub fn render_tree_outline(tree: &TreeNode, selection: &IndexSet<String>) -> String {
    render_outline(tree, |node| {
        if selection.contains(&node.path) {
            SELECTED_MARK
        } else {
            UNSELECTED_MARK
        }
    })
}

fn render_node<F>(
    node: &TreeNode,
    prefix: &str,
    is_last: bool,
    is_root: bool,
    marker: &F,
    out: &mut String,
) where
    F: Fn(&TreeNode) -> &'static str,
{
    let icon = if node.is_dir() { DIRECTORY_ICON } else { FILE_ICON };
    let connector = match (is_root, is_last) {
        (true, _) => "",
        (false, true) => "└── ",
        (false, false) => "├── ",
    };
    out.push_str(&format!(
        "{}{}{} {} {} ({})\n",
        prefix,
        connector,
        marker(node),
        icon,
        node.name,
        node.formatted_size
    ));

    let child_prefix = match (is_root, is_last) {
        (true, _) => String::new(),
        (false, true) => format!("{}    ", prefix),
        (false, false) => format!("{}│   ", prefix),
    };
    let children = node.children();
    for (i, child) in children.iter().enumerate() {
        render_node(
            child,
            &child_prefix,
            i + 1 == children.len(),
            false,
            marker,
            out,
        );
    }
}

/// Renders the full export text: tree section, then one block per selected file
/// in selection order. Unreadable files get an inline error marker.
pub fn render_export(
    tree: &TreeNode,
    selection: &IndexSet<String>,
    root: &Path,
) -> ExportDocument {
    let mut text = String::new();
    text.push_str(TREE_SECTION_HEADER);
    text.push('\n');
    text.push_str(&render_tree_outline(tree, selection));
    text.push('\n');
    text.push_str(CONTENT_SECTION_HEADER);
    text.push('\n');

    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let mut file_count = 0;
    for path in selection {
        let is_file = tree.find(path).is_some_and(TreeNode::is_file);
        if !is_file {
            continue;
        }

        text.push_str(&format!("--- File: {} ---\n", path));
        match read_contained(&root, path) {
            Ok(content) => {
                log::trace!("Embedding {} ({} bytes)", path, content.len());
                text.push_str(&content);
                file_count += 1;
            }
            Err(e) => {
                log::warn!("{}", e);
                text.push_str(&format!("[Error reading file: {}]", error_detail(&e)));
            }
        }
        text.push_str("\n\n");
    }

    if file_count == 0 {
        text.push_str(NOTHING_EXPORTED_NOTICE);
        text.push('\n');
    }

    ExportDocument { text, file_count }
}

fn read_contained(root: &Path, relative: &str) -> Result<String> {
    let resolved = resolve_within_root(root, relative)?;
    fs::read_to_string(&resolved).map_err(|e| AppError::FileRead {
        path: resolved,
        source: e,
    })
}

fn error_detail(err: &AppError) -> String {
    match err {
        AppError::FileRead { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

pub fn default_file_name(root_name: &str, now: DateTime<Local>) -> String {
    format!("{}_export_{}.txt", root_name, now.format("%Y-%m-%d_%H%M%S"))
}

/// Custom names are used verbatim but must be a bare file name.
pub fn resolve_file_name(custom: Option<&str>, root_name: &str) -> Result<String> {
    match custom.filter(|name| !name.trim().is_empty()) {
        Some(name) => {
            if name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(AppError::InvalidArgument(format!(
                    "Export file name must not contain path components: '{}'",
                    name
                )));
            }
            Ok(name.to_string())
        }
        None => Ok(default_file_name(root_name, Local::now())),
    }
}

/// Writes `text` to `output_dir/file_name`, creating the directory if needed.
/// Returns the absolute path of the written file.
pub fn write_export(output_dir: &Path, file_name: &str, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|e| AppError::DirCreation {
        path: output_dir.to_path_buf(),
        source: e,
    })?;
    let file_path = output_dir.join(file_name);
    fs::write(&file_path, text).map_err(|e| AppError::FileWrite {
        path: file_path.clone(),
        source: e,
    })?;
    fs::canonicalize(&file_path).map_err(AppError::Io)
}

/// Exports the tree plus the content of every selected file.
///
/// Fails with [`AppError::EmptySelection`] before touching the filesystem when
/// nothing is selected.
pub fn export_selection(
    tree: &TreeNode,
    selection: &IndexSet<String>,
    root: &Path,
    output_dir: &Path,
    custom_file_name: Option<&str>,
) -> Result<ExportResult> {
    if selection.is_empty() {
        return Err(AppError::EmptySelection);
    }

    let file_name = resolve_file_name(custom_file_name, &tree.name)?;
    let document = render_export(tree, selection, root);
    let path = write_export(output_dir, &file_name, &document.text)?;
    let directory = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_dir.to_path_buf());

    log::info!(
        "Exported {} file(s) to {}",
        document.file_count,
        path.display()
    );
    Ok(ExportResult {
        path,
        directory,
        file_count: document.file_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_tree() -> TreeNode {
        TreeNode::directory(
            "proj".to_string(),
            String::new(),
            vec![
                TreeNode::directory(
                    "src".to_string(),
                    "src".to_string(),
                    vec![
                        TreeNode::file("a.rs".to_string(), "src/a.rs".to_string(), 1536),
                        TreeNode::file("b.rs".to_string(), "src/b.rs".to_string(), 0),
                    ],
                ),
                TreeNode::file("README.md".to_string(), "README.md".to_string(), 1),
            ],
        )
    }

    #[test]
    fn outline_marks_exact_membership() {
        let selection: IndexSet<String> = ["src/a.rs".to_string()].into_iter().collect();
        let outline = render_tree_outline(&sample_tree(), &selection);
        let expected = "\
[ ] 📁 proj (1.5 KB)
├── [ ] 📁 src (1.5 KB)
│   ├── [x] 📄 a.rs (1.5 KB)
│   └── [ ] 📄 b.rs (0 B)
└── [ ] 📄 README.md (1 B)
";
        assert_eq!(outline, expected);
    }

    #[test]
    fn default_file_name_is_filesystem_safe() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let name = default_file_name("proj", now);
        assert_eq!(name, "proj_export_2024-03-09_070501.txt");
        assert!(!name.contains(':'));
    }

    #[test]
    fn custom_file_name_is_verbatim_unless_blank() {
        assert_eq!(
            resolve_file_name(Some("my out.md"), "proj").unwrap(),
            "my out.md"
        );
        assert!(
            resolve_file_name(Some("   "), "proj")
                .unwrap()
                .starts_with("proj_export_")
        );
        assert!(resolve_file_name(None, "proj").unwrap().ends_with(".txt"));
        assert!(matches!(
            resolve_file_name(Some("../escape.txt"), "proj"),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn only_directories_selected_yields_notice() {
        let dir = tempfile::tempdir().unwrap();
        let selection: IndexSet<String> = ["src".to_string()].into_iter().collect();
        let doc = render_export(&sample_tree(), &selection, dir.path());

        assert_eq!(doc.file_count, 0);
        assert!(doc.text.ends_with(&format!("{}\n", NOTHING_EXPORTED_NOTICE)));
        assert!(doc.text.starts_with(TREE_SECTION_HEADER));
    }

    #[test]
    fn unreadable_file_gets_inline_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/b.rs"), "fn b() {}").unwrap();
        // src/a.rs is in the tree but missing on disk.
        let selection: IndexSet<String> = ["src/a.rs".to_string(), "src/b.rs".to_string()]
            .into_iter()
            .collect();

        let doc = render_export(&sample_tree(), &selection, dir.path());

        assert_eq!(doc.file_count, 1);
        assert!(doc.text.contains("--- File: src/a.rs ---\n[Error reading file:"));
        assert!(doc.text.contains("--- File: src/b.rs ---\nfn b() {}\n\n"));
        assert!(!doc.text.contains(NOTHING_EXPORTED_NOTICE));
    }

    #[test]
    fn empty_selection_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let err = export_selection(&sample_tree(), &IndexSet::new(), dir.path(), &out, None)
            .unwrap_err();

        assert!(matches!(err, AppError::EmptySelection));
        assert!(!out.exists());
    }

    #[cfg(unix)]
    #[test]
    fn linked_file_outside_root_is_not_embedded() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "TOPSECRET").unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            dir.path().join("src/a.rs"),
        )
        .unwrap();
        let selection: IndexSet<String> = ["src/a.rs".to_string()].into_iter().collect();

        let doc = render_export(&sample_tree(), &selection, dir.path());

        assert_eq!(doc.file_count, 0);
        assert!(!doc.text.contains("TOPSECRET"));
        assert!(doc.text.contains("--- File: src/a.rs ---\n[Error reading file:"));
    }
}
