use clap::{Args, Parser, Subcommand};

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOpts {
    #[arg(
        long,
        help = "Path of the TOML config file (default: .treepick/treepick.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "disable_config_file",
        help_heading = "Configuration"
    )]
    pub config_file: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config_file",
        help_heading = "Configuration"
    )]
    pub disable_config_file: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExclusionOpts {
    #[arg(
        short = 'x',
        long = "exclude",
        value_name = "NAME",
        action = clap::ArgAction::Append,
        help = "Skip every entry with this exact name (repeatable).",
        help_heading = "Exclusions"
    )]
    pub exclude: Vec<String>,

    #[arg(
        long,
        help = "Do not apply the builtin exclusion list (node_modules, .git, target, ...).",
        help_heading = "Exclusions"
    )]
    pub no_default_exclusions: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatOutputOpts {
    #[arg(short = 'f', long, help = "Set the output format.", value_name = "FORMAT", value_parser = ["text", "json", "yaml"], help_heading = "Output Formatting")]
    pub format: Option<String>,

    #[arg(
        long,
        help = "Pretty-print JSON output.",
        help_heading = "Output Formatting"
    )]
    pub pretty: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "treepick",
    author,
    version,
    about = "Browse a directory tree, pick files and export them into one text file.",
    long_about = "treepick walks a directory (skipping excluded names), lets you select files and \nfolders, and exports the tree outline plus the content of every selected file \ninto a single text file.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  treepick tree . -x node_modules\n  treepick export . --select src --deselect src/generated -o context.txt\n  treepick cat . src/main.rs\n  treepick session < requests.jsonl",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(visible_alias = "t", about = "Print the directory tree with sizes.")]
    Tree(TreeArgs),

    #[command(visible_alias = "c", about = "Print the content of one file under the root.")]
    Cat(CatArgs),

    #[command(
        visible_alias = "e",
        about = "Select files/folders and export them into one text file."
    )]
    Export(ExportArgs),

    #[command(
        visible_alias = "s",
        about = "Answer JSON-lines requests (load, setSelection, count, getFileContent, export) on stdin."
    )]
    Session(SessionArgs),

    #[command(about = "Show or save the default configuration file.")]
    Config(ConfigArgs),

    #[command(about = "Generate or save shell completion scripts.")]
    Completion(CompletionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    #[arg(default_value = ".", value_name = "ROOT", help = "Directory to scan.")]
    pub root: String,

    #[clap(flatten)]
    pub config: ConfigOpts,
    #[clap(flatten)]
    pub exclusion: ExclusionOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,

    #[arg(
        long,
        value_name = "PATH",
        action = clap::ArgAction::Append,
        help = "Preview selection markers for these relative paths (repeatable)."
    )]
    pub select: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CatArgs {
    #[arg(value_name = "ROOT", help = "Directory the path is relative to.")]
    pub root: String,

    #[arg(value_name = "PATH", help = "Relative path of the file to print.")]
    pub path: String,

    #[clap(flatten)]
    pub config: ConfigOpts,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(default_value = ".", value_name = "ROOT", help = "Directory to scan.")]
    pub root: String,

    #[clap(flatten)]
    pub config: ConfigOpts,
    #[clap(flatten)]
    pub exclusion: ExclusionOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,

    #[arg(
        long,
        value_name = "PATH",
        action = clap::ArgAction::Append,
        required = true,
        help = "Select a relative path and everything below it. Use \"\" for the whole tree.",
        help_heading = "Selection"
    )]
    pub select: Vec<String>,

    #[arg(
        long,
        value_name = "PATH",
        action = clap::ArgAction::Append,
        help = "Deselect a relative path and everything below it (applied after --select).",
        help_heading = "Selection"
    )]
    pub deselect: Vec<String>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE_NAME",
        help = "Export file name (default: <root>_export_<timestamp>.txt).",
        help_heading = "Output Control"
    )]
    pub output: Option<String>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory the export is written to (default: exports).",
        help_heading = "Output Control"
    )]
    pub output_dir: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    #[clap(flatten)]
    pub config: ConfigOpts,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory exports are written to (default: exports)."
    )]
    pub output_dir: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        long,
        help = "Save default config structure to default path (prompts overwrite)."
    )]
    pub save: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        help = "Shell to generate completions for (fish, bash, zsh) [default: fish]"
    )]
    pub shell: Option<String>,
    #[arg(
        long,
        help = "Save completion script to default location (prompts overwrite)."
    )]
    pub save: bool,
}
