pub mod config;
pub mod error;
pub mod export;
pub mod output_formats;
pub mod protocol;
pub mod session;
pub mod tree;

pub use config::{Config, ExportConfig, ScanConfig, expand_path};
pub use error::{AppError, Result};
pub use export::{ExportResult, render_outline, render_tree_outline};
pub use output_formats::{format_size, get_default_exclusions};
pub use protocol::{Request, Response, handle_line, handle_request, serve};
pub use session::{SelectionState, Session, resolve_within_root};
pub use tree::{NodeType, TreeNode, build_tree};
