use anyhow::{Context, Result};
use colored::*;
use log;
use treepick_core::{SelectionState, Session, expand_path, render_outline};

use crate::cli_args::TreeArgs;
use crate::load_config_for_command;
use crate::output::{display_path, print_data_or_text};

const PARTIAL_MARK: &str = "[~]";

pub fn handle_tree_command(args: TreeArgs, quiet: bool) -> Result<()> {
    let config = load_config_for_command(&args.config, Some(&args.exclusion))?;
    let root = expand_path(&args.root);

    let mut session = Session::from_config(&config);
    session
        .load(&root, config.effective_exclusions())
        .with_context(|| format!("Failed to load {}", root.display()))?;

    for path in &args.select {
        if !session.set_selected(path, true) {
            log::warn!("Path not found in tree, ignored: {}", path);
        }
    }

    let Some(tree) = session.tree() else {
        anyhow::bail!("No tree was loaded");
    };

    let states = session.selection_states();
    let outline = render_outline(tree, |node| match states.get(&node.path) {
        Some(SelectionState::Selected) => "[x]",
        Some(SelectionState::Partial) => PARTIAL_MARK,
        _ => "[ ]",
    });

    print_data_or_text(tree, Some(outline), &args.format_output, "text")?;

    let is_text = args.format_output.format.as_deref().unwrap_or("text") == "text";
    if is_text && !quiet {
        if let Some(root) = session.root() {
            eprintln!(
                "{} {} file(s), {} under {}",
                "ℹ".blue(),
                tree.file_count().to_string().cyan(),
                tree.formatted_size.cyan(),
                display_path(root).blue()
            );
        }
        if !args.select.is_empty() {
            eprintln!(
                "{} {} file(s) selected",
                "ℹ".blue(),
                session.selected_file_count().to_string().cyan()
            );
        }
    }
    Ok(())
}
