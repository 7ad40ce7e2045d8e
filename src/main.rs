mod args;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use contextgrab::logging::initialize_logger;
use contextgrab::output::{handle_output, Sink, SystemClipboard};
use contextgrab::{render_all, Excludes, RenderOptions};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = args::Args::parse();
    initialize_logger();

    let options = RenderOptions {
        include_outputs: args.include_outputs,
        respect_gitignore: !args.no_gitignore,
        excludes: Excludes::new(&args.exclude)?,
    };
    let text = render_all(&args.paths, &options)?;

    let sink = if args.stdout {
        Sink::Stdout
    } else if let Some(out) = args.out {
        Sink::File(PathBuf::from(out))
    } else {
        Sink::Clipboard
    };

    let stdout = io::stdout();
    handle_output(&text, &sink, &mut SystemClipboard::default(), &mut stdout.lock())?;
    Ok(())
}
