//! Concatenate a file or a directory tree into one block of text.

pub mod error;
pub mod gitignore;
pub mod logging;
pub mod notebook;
pub mod output;
pub mod walker;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub use error::{GrabError, Result};
pub use walker::{DocumentKind, Excludes, FileEntry, TextRead, WalkOptions};

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub include_outputs: bool,
    pub respect_gitignore: bool,
    pub excludes: Excludes,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_outputs: false,
            respect_gitignore: true,
            excludes: Excludes::default(),
        }
    }
}

impl RenderOptions {
    pub fn new(include_outputs: bool) -> Self {
        Self {
            include_outputs,
            ..Self::default()
        }
    }

    fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            include_outputs: self.include_outputs,
            respect_gitignore: self.respect_gitignore,
            excludes: self.excludes.clone(),
        }
    }
}

/// Renders a directory tree or a single file. Anything else is `NotFound`.
pub fn render(path: &Path, options: &RenderOptions) -> Result<String> {
    let target = match fs::canonicalize(path) {
        Ok(target) => target,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(GrabError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(GrabError::io(path, err)),
    };
    let metadata = fs::metadata(&target).map_err(|err| GrabError::io(&target, err))?;

    if metadata.is_dir() {
        walker::walk(&target, &options.walk_options())
    } else if metadata.is_file() {
        render_file(&target, options)
    } else {
        Err(GrabError::NotFound(path.to_path_buf()))
    }
}

/// Renders each path in order, separated by a newline.
pub fn render_all<P: AsRef<Path>>(paths: &[P], options: &RenderOptions) -> Result<String> {
    let blocks = paths
        .iter()
        .map(|path| render(path.as_ref(), options))
        .collect::<Result<Vec<_>>>()?;
    Ok(blocks.join("\n"))
}

fn render_file(path: &Path, options: &RenderOptions) -> Result<String> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let body = match DocumentKind::of(path) {
        DocumentKind::Notebook => notebook::flatten(path, options.include_outputs)?,
        DocumentKind::Plain => match walker::read_text(path)? {
            TextRead::Text(text) => text,
            TextRead::Binary => return Err(GrabError::Binary(path.to_path_buf())),
        },
    };

    Ok(format!("FILE: {name}\n{body}"))
}
