use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::error::{GrabError, Result};
use crate::gitignore::IgnoreSpec;
use crate::notebook;

/// How a file's contents are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Notebook,
    Plain,
}

impl DocumentKind {
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ipynb") => DocumentKind::Notebook,
            _ => DocumentKind::Plain,
        }
    }
}

/// Outcome of reading a file as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRead {
    Text(String),
    Binary,
}

/// Reads `path` as UTF-8 with `\r\n` and lone `\r` line endings turned into `\n`.
pub fn read_text(path: &Path) -> Result<TextRead> {
    let bytes = fs::read(path).map_err(|err| GrabError::io(path, err))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => TextRead::Text(normalize_newlines(text)),
        Err(_) => TextRead::Binary,
    })
}

fn normalize_newlines(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text
    }
}

/// Extra exclusion globs matched against paths relative to the walk root.
#[derive(Debug, Clone)]
pub struct Excludes {
    set: GlobSet,
}

impl Excludes {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            set: builder.build()?,
        })
    }

    pub fn is_match(&self, relative: &Path) -> bool {
        !self.set.is_empty() && self.set.is_match(relative)
    }
}

impl Default for Excludes {
    fn default() -> Self {
        Self {
            set: GlobSet::empty(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub include_outputs: bool,
    pub respect_gitignore: bool,
    pub excludes: Excludes,
}

/// One rendered file of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub relative: PathBuf,
    pub body: String,
}

impl FileEntry {
    pub fn separator(&self) -> String {
        format!("=== {} ===", self.relative.display())
    }
}

/// Renders every non-ignored file under `root` behind a `FOLDER:` header.
pub fn walk(root: &Path, options: &WalkOptions) -> Result<String> {
    let name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut lines = vec![format!("FOLDER: {name}")];

    for entry in collect_entries(root, options)? {
        lines.push(entry.separator());
        lines.push(entry.body);
    }

    Ok(lines.join("\n"))
}

/// Visits `root` and its subdirectories, returning the rendered files in
/// visitation order.
pub fn collect_entries(root: &Path, options: &WalkOptions) -> Result<Vec<FileEntry>> {
    let spec = if options.respect_gitignore {
        IgnoreSpec::build(root)
    } else {
        IgnoreSpec::empty()
    };
    debug!("walking {} with {} ignore patterns", root.display(), spec.len());

    let mut entries = Vec::new();
    walk_directory(root, root, &spec, options, &mut entries)?;
    Ok(entries)
}

fn walk_directory(
    root: &Path,
    directory: &Path,
    spec: &IgnoreSpec,
    options: &WalkOptions,
    entries: &mut Vec<FileEntry>,
) -> Result<()> {
    let listing = match fs::read_dir(directory) {
        Ok(listing) => listing,
        Err(err) => {
            debug!("skipping unreadable directory {}: {err}", directory.display());
            return Ok(());
        }
    };

    let mut files = Vec::new();
    let mut subdirectories = Vec::new();
    for entry in listing {
        let entry = entry.map_err(|err| GrabError::io(directory, err))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|err| GrabError::io(&path, err))?;

        if file_type.is_dir() {
            subdirectories.push(path);
        } else if file_type.is_file() {
            files.push(path);
        } else if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(target) if target.is_file() => files.push(path),
                Ok(target) if target.is_dir() => {
                    debug!("not following directory link {}", path.display());
                }
                _ => debug!("skipping dangling or special link {}", path.display()),
            }
        } else {
            debug!("skipping special file {}", path.display());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for path in files {
        if let Some(entry) = render_entry(root, &path, spec, options)? {
            entries.push(entry);
        }
    }

    for subdirectory in subdirectories {
        walk_directory(root, &subdirectory, spec, options, entries)?;
    }

    Ok(())
}

fn render_entry(
    root: &Path,
    path: &Path,
    spec: &IgnoreSpec,
    options: &WalkOptions,
) -> Result<Option<FileEntry>> {
    let relative = match path.strip_prefix(root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => return Ok(None),
    };

    if spec.matches(path, root) || options.excludes.is_match(&relative) {
        debug!("ignored {}", relative.display());
        return Ok(None);
    }

    let body = match DocumentKind::of(path) {
        DocumentKind::Notebook => notebook::flatten(path, options.include_outputs)?,
        DocumentKind::Plain => match read_text(path)? {
            TextRead::Text(text) => text,
            TextRead::Binary => {
                debug!("skipping binary file {}", relative.display());
                return Ok(None);
            }
        },
    };

    Ok(Some(FileEntry { relative, body }))
}
