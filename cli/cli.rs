mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use log;
use std::env;
use std::process;

use cli_args::{Cli, Commands, ConfigOpts, ExclusionOpts};
use treepick_core::{AppError, Config};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = match e.downcast_ref::<AppError>() {
                Some(AppError::Config(_)) => 1,
                Some(AppError::TomlParse(_)) => 1,
                Some(AppError::TomlSerialize(_)) => 1,
                Some(AppError::Io(_)) => 2,
                Some(AppError::FileRead { .. }) => 2,
                Some(AppError::FileWrite { .. }) => 2,
                Some(AppError::DirCreation { .. }) => 2,
                Some(AppError::DirectoryRead { .. }) => 2,
                Some(AppError::InvalidPath(_)) => 3,
                Some(AppError::NotFound(_)) => 3,
                Some(AppError::PathOutsideRoot(_)) => 3,
                Some(AppError::EmptySelection) => 4,
                Some(AppError::NotLoaded) => 4,
                Some(AppError::InvalidArgument(_)) => 5,
                Some(AppError::JsonSerialize(_)) => 6,
                Some(AppError::YamlError(_)) => 6,
                Some(_) => 1,
                None => 1,
            };

            // Usage-type failures are reported even in quiet mode.
            if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    match cli.command {
        None => {
            Cli::command().print_help()?;
        }
        Some(command) => match command {
            Commands::Tree(args) => {
                log::debug!("Executing 'tree' command...");
                commands::tree::handle_tree_command(args, quiet)?;
            }
            Commands::Cat(args) => {
                log::debug!("Executing 'cat' command...");
                commands::cat::handle_cat_command(args)?;
            }
            Commands::Export(args) => {
                log::debug!("Executing 'export' command...");
                commands::export::handle_export_command(args, quiet)?;
            }
            Commands::Session(args) => {
                log::debug!("Executing 'session' command...");
                commands::session::handle_session_command(args)?;
            }
            Commands::Config(args) => {
                log::debug!("Executing 'config' command...");
                let base_dir = env::current_dir().context("Failed to read current directory")?;
                commands::config::handle_config_command(&args, &base_dir, quiet)?;
            }
            Commands::Completion(args) => {
                log::debug!("Executing 'completion' command...");
                commands::completion::handle_completion_command(&args, quiet)?;
            }
        },
    }
    Ok(())
}

/// Loads the config file (if any) from the current directory and applies the
/// command's exclusion flags on top.
pub fn load_config_for_command(
    config_opts: &ConfigOpts,
    exclusion_opts: Option<&ExclusionOpts>,
) -> Result<Config> {
    let base_dir = env::current_dir().context("Failed to read current directory")?;
    let config_path = Config::resolve_config_path(
        &base_dir,
        config_opts.config_file.as_ref(),
        config_opts.disable_config_file,
    )
    .context("Failed to resolve configuration path")?;

    let mut config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(opts) = exclusion_opts {
        if opts.no_default_exclusions {
            config.scan.use_default_exclusions = false;
        }
        config.scan.exclude.extend(opts.exclude.iter().cloned());
    }

    log::trace!("Effective config: {:?}", config);
    Ok(config)
}
