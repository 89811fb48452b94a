use anyhow::{Context, Result};
use treepick_core::{Session, expand_path};

use crate::cli_args::CatArgs;
use crate::load_config_for_command;
use crate::output::write_to_stdout;

pub fn handle_cat_command(args: CatArgs) -> Result<()> {
    let config = load_config_for_command(&args.config, None)?;
    let root = expand_path(&args.root);

    let mut session = Session::from_config(&config);
    session
        .load(&root, config.effective_exclusions())
        .with_context(|| format!("Failed to load {}", root.display()))?;

    let content = session.file_content(&args.path)?;
    write_to_stdout(&content)
}
