use anyhow::{Context, Result};
use std::io;
use treepick_core::{Session, expand_path, serve};

use crate::cli_args::SessionArgs;
use crate::load_config_for_command;

/// Answers JSON-lines requests on stdin until it closes.
pub fn handle_session_command(args: SessionArgs) -> Result<()> {
    let config = load_config_for_command(&args.config, None)?;
    let mut session = Session::from_config(&config);
    if let Some(dir) = &args.output_dir {
        session.set_output_dir(expand_path(dir));
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&mut session, stdin.lock(), stdout.lock()).context("Session input/output failed")?;
    Ok(())
}
