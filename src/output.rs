use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

/// Where the rendered text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File(PathBuf),
    Clipboard,
}

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;

    /// Keeps the copied text available after `set_text`, for platforms where
    /// the clipboard contents live only as long as the owning process.
    fn serve(&mut self) -> Result<()> {
        Ok(())
    }
}

/// The system clipboard.
#[derive(Default)]
pub struct SystemClipboard {
    #[cfg(target_os = "linux")]
    held: Option<(arboard::Clipboard, String)>,
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text.to_owned())?;
        #[cfg(target_os = "linux")]
        {
            self.held = Some((clipboard, text.to_owned()));
        }
        Ok(())
    }

    /// X11 and Wayland drop the selection when its owner exits, so block
    /// until another program takes it over.
    #[cfg(target_os = "linux")]
    fn serve(&mut self) -> Result<()> {
        use arboard::SetExtLinux;

        if let Some((mut clipboard, text)) = self.held.take() {
            clipboard.set().wait().text(text)?;
        }
        Ok(())
    }
}

/// Hands `text` to `sink`. An unusable clipboard falls back to printing.
pub fn handle_output<W: Write>(
    text: &str,
    sink: &Sink,
    clipboard: &mut dyn Clipboard,
    out: &mut W,
) -> Result<()> {
    match sink {
        Sink::Stdout => writeln!(out, "{text}")?,
        Sink::File(path) => {
            fs::write(path, text)
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            writeln!(out, "Output written to {}.", path.display())?;
        }
        Sink::Clipboard => match clipboard.set_text(text) {
            Ok(()) => {
                writeln!(out, "Copied to clipboard.")?;
                out.flush()?;
                if let Err(err) = clipboard.serve() {
                    debug!("stopped serving clipboard contents: {err:#}");
                }
            }
            Err(err) => {
                debug!("clipboard unavailable, printing instead: {err:#}");
                writeln!(out, "{text}")?;
            }
        },
    }
    Ok(())
}
