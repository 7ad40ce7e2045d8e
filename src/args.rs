use clap::Parser;

/// Copy the contents of a file or folder, honoring .gitignore files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Files or directories to copy (default: current directory).
    #[arg(default_value = ".")]
    pub paths: Vec<String>,

    /// Include notebook cell outputs.
    #[arg(long, env = "CONTEXTGRAB_INCLUDE_OUTPUTS")]
    pub include_outputs: bool,

    /// Print to standard output instead of the clipboard.
    #[arg(long, env = "CONTEXTGRAB_STDOUT")]
    pub stdout: bool,

    /// Output to a file instead of the clipboard.
    #[arg(long, value_name = "FILE")]
    pub out: Option<String>,

    /// Glob patterns to exclude, relative to each walked folder.
    #[arg(short = 'x', long)]
    pub exclude: Vec<String>,

    /// Do not respect .gitignore files.
    #[arg(long, env = "CONTEXTGRAB_NO_GITIGNORE")]
    pub no_gitignore: bool,
}
