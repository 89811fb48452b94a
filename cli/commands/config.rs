use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::Path;
use treepick_core::Config;
use treepick_core::config::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME};

use crate::cli_args::ConfigArgs;
use crate::output::{confirm_overwrite, write_to_stdout};

pub fn handle_config_command(args: &ConfigArgs, base_dir: &Path, quiet: bool) -> Result<()> {
    let content = Config::default()
        .to_toml_string()
        .context("Failed to serialize default config")?;

    if !args.save {
        return write_to_stdout(&content);
    }

    let save_dir = base_dir.join(DEFAULT_CONFIG_DIR);
    let save_path = save_dir.join(DEFAULT_CONFIG_FILENAME);
    if !confirm_overwrite(&save_path, "Config file", quiet)? {
        return Ok(());
    }

    fs::create_dir_all(&save_dir)
        .with_context(|| format!("Failed to create directory {}", save_dir.display()))?;
    fs::write(&save_path, content)
        .with_context(|| format!("Failed to write file {}", save_path.display()))?;
    log::info!("Wrote default config to {}", save_path.display());

    if !quiet {
        println!(
            "{} Default config saved to: {}",
            "✅".green(),
            save_path.display().to_string().blue()
        );
    }
    Ok(())
}
