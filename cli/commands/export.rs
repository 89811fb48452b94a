use anyhow::{Context, Result};
use log;
use treepick_core::{Session, expand_path};

use crate::cli_args::ExportArgs;
use crate::load_config_for_command;
use crate::output::{print_data_or_text, print_export_summary};

pub fn handle_export_command(args: ExportArgs, quiet: bool) -> Result<()> {
    let config = load_config_for_command(&args.config, Some(&args.exclusion))?;
    let root = expand_path(&args.root);

    let mut session = Session::from_config(&config);
    if let Some(dir) = &args.output_dir {
        session.set_output_dir(expand_path(dir));
    }
    session
        .load(&root, config.effective_exclusions())
        .with_context(|| format!("Failed to load {}", root.display()))?;

    for path in &args.select {
        if !session.set_selected(path, true) {
            log::warn!("Path not found in tree, ignored: {}", path);
        }
    }
    for path in &args.deselect {
        if !session.set_selected(path, false) {
            log::warn!("Path not found in tree, ignored: {}", path);
        }
    }
    log::info!(
        "{} path(s) selected, {} file(s)",
        session.selection().len(),
        session.selected_file_count()
    );

    let file_name = args.output.as_deref().or(config.export.file_name.as_deref());
    let result = session.export(file_name)?;

    match args.format_output.format.as_deref() {
        Some("json") | Some("yaml") => {
            print_data_or_text(&result, None, &args.format_output, "json")?;
        }
        _ if quiet => {}
        _ => print_export_summary(&result, &session)?,
    }
    Ok(())
}
