use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::env;
use std::io::{self, Write};
use std::path::Path;
use treepick_core::{ExportResult, Session, output_formats};

use crate::cli_args::FormatOutputOpts;

/// Writes `data` in the requested structured format, or `plain_text` for `text`.
pub fn print_data_or_text<T: Serialize>(
    data: &T,
    plain_text: Option<String>,
    format_opts: &FormatOutputOpts,
    default_format: &str,
) -> Result<()> {
    let format = format_opts
        .format
        .as_deref()
        .unwrap_or(default_format)
        .to_lowercase();

    if format == "text" {
        match plain_text {
            Some(text) => write_to_stdout(&text),
            None => {
                let content = output_formats::serialize_to_json(data, true)?;
                write_to_stdout(&content)
            }
        }
    } else {
        let content = serialize_output(data, &format, format_opts.pretty)?;
        write_to_stdout(&content)
    }
}

fn serialize_output<T: Serialize>(data: &T, format: &str, pretty_json: bool) -> Result<String> {
    match format {
        "yaml" | "yml" => output_formats::serialize_to_yaml(data).map_err(anyhow::Error::from),
        _ => output_formats::serialize_to_json(data, pretty_json).map_err(anyhow::Error::from),
    }
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// `path` relative to the working directory when it lives below it.
pub fn display_path(path: &Path) -> String {
    env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd))
        .filter(|rel| !rel.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

/// Summary of a finished export: where it went and which files it embedded.
pub fn print_export_summary(result: &ExportResult, session: &Session) -> Result<()> {
    println!(
        "{} Exported {} file(s) to: {}",
        "✅".green(),
        result.file_count.to_string().cyan(),
        display_path(&result.path).blue()
    );

    let Some(tree) = session.tree() else {
        return Ok(());
    };
    let files: Vec<_> = session
        .selection()
        .iter()
        .filter_map(|path| tree.find(path))
        .filter(|node| node.is_file())
        .collect();

    if files.is_empty() {
        println!("{}", "(No files selected, only folders)".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Path").fg(Color::Green),
        Cell::new("Size").fg(Color::Green),
    ]);
    for node in files {
        table.add_row(vec![
            Cell::new(&node.path).fg(Color::Cyan),
            Cell::new(&node.formatted_size)
                .set_alignment(CellAlignment::Right)
                .fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Asks before replacing an existing file. Quiet mode never overwrites.
pub fn confirm_overwrite(path: &Path, what: &str, quiet: bool) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    if quiet {
        anyhow::bail!(
            "Target file '{}' exists. Overwrite prevented in quiet mode.",
            path.display()
        );
    }
    print!(
        "{} {} already exists at '{}'. Overwrite? [{}/{}] ",
        "⚠️".yellow(),
        what,
        path.display().to_string().cyan(),
        "y".green(),
        "N".red()
    );
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .context("Failed to read user input")?;
    if response.trim().eq_ignore_ascii_case("y") {
        Ok(true)
    } else {
        println!("Save cancelled.");
        Ok(false)
    }
}
