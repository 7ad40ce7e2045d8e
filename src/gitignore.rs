//! Ancestor `.gitignore` collection and matching.
//!
//! Every `.gitignore` between the starting directory and the filesystem root
//! is read once and merged into a single matcher anchored at the starting
//! directory. Patterns are not scoped to the directory they were found in.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Compiled ignore patterns for one invocation.
#[derive(Debug, Clone)]
pub struct IgnoreSpec {
    matcher: Gitignore,
}

impl IgnoreSpec {
    /// Collects every ancestor `.gitignore` of `start_dir` (inclusive) and
    /// compiles them into one matcher rooted at `start_dir`.
    pub fn build(start_dir: &Path) -> Self {
        let sources = collect_pattern_sources(start_dir);
        Self::from_sources(start_dir, &sources)
    }

    /// Compiles already collected ignore-file contents, in the given order.
    pub fn from_sources(root: &Path, sources: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        for line in sources.iter().flat_map(|source| source.lines()) {
            if let Err(err) = builder.add_line(None, line) {
                warn!("skipping ignore pattern {line:?}: {err}");
            }
        }

        let matcher = match builder.build() {
            Ok(matcher) => matcher,
            Err(err) => {
                warn!("failed to compile ignore patterns: {err}");
                Gitignore::empty()
            }
        };
        Self { matcher }
    }

    /// Matches nothing.
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.matcher.num_ignores() as usize + self.matcher.num_whitelists() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports whether `path` is ignored relative to `base`. Paths outside
    /// `base` are never ignored.
    pub fn matches(&self, path: &Path, base: &Path) -> bool {
        let relative = match path.strip_prefix(base) {
            Ok(relative) => relative,
            Err(_) => return false,
        };
        if relative.as_os_str().is_empty() {
            return false;
        }

        self.matcher
            .matched_path_or_any_parents(relative, path.is_dir())
            .is_ignore()
    }
}

/// Reads `.gitignore` from `start_dir` and each of its ancestors, child first.
/// Missing or unreadable files contribute nothing.
pub fn collect_pattern_sources(start_dir: &Path) -> Vec<String> {
    let mut sources = Vec::new();
    let mut current: Option<PathBuf> = Some(start_dir.to_path_buf());

    while let Some(dir) = current {
        let candidate = dir.join(IGNORE_FILE_NAME);
        if candidate.is_file() {
            match fs::read_to_string(&candidate) {
                Ok(contents) => {
                    debug!("loaded ignore patterns from {}", candidate.display());
                    sources.push(contents);
                }
                Err(err) => debug!("unreadable ignore file {}: {err}", candidate.display()),
            }
        }
        current = dir.parent().map(Path::to_path_buf);
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn collects_sources_child_first() {
        let temp = tempdir().unwrap();
        let child = temp.path().join("child");
        fs::create_dir_all(&child).unwrap();
        fs::write(temp.path().join(IGNORE_FILE_NAME), "*.log\n").unwrap();
        fs::write(child.join(IGNORE_FILE_NAME), "build/\n").unwrap();

        let sources = collect_pattern_sources(&child);

        assert!(sources.len() >= 2);
        assert_eq!(sources[0], "build/\n");
        assert_eq!(sources[1], "*.log\n");
    }

    #[test]
    fn ancestor_patterns_apply_relative_to_start() {
        let temp = tempdir().unwrap();
        let sub = temp.path().join("sub");
        fs::create_dir_all(sub.join("nested")).unwrap();
        fs::write(temp.path().join(IGNORE_FILE_NAME), "*.log\n").unwrap();

        let spec = IgnoreSpec::build(&sub);

        assert!(spec.matches(&sub.join("b.log"), &sub));
        assert!(spec.matches(&sub.join("nested/c.log"), &sub));
        assert!(!spec.matches(&sub.join("a.txt"), &sub));
    }

    #[test]
    fn paths_outside_base_are_never_ignored() {
        let root = Path::new("/project");
        let spec = IgnoreSpec::from_sources(root, &["*.log".to_string()]);

        assert!(!spec.matches(Path::new("/elsewhere/b.log"), root));
    }

    #[test]
    fn supports_negation_anchoring_and_directories() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::create_dir_all(root.join("src/build")).unwrap();

        let spec = IgnoreSpec::from_sources(
            root,
            &["*.log\n!keep.log\n/top.txt\nbuild/\ndocs/**/*.md\n".to_string()],
        );

        assert!(spec.matches(&root.join("a.log"), root));
        assert!(!spec.matches(&root.join("keep.log"), root));
        assert!(spec.matches(&root.join("top.txt"), root));
        assert!(!spec.matches(&root.join("src/top.txt"), root));
        assert!(spec.matches(&root.join("build/out.o"), root));
        assert!(spec.matches(&root.join("src/build/out.o"), root));
        assert!(spec.matches(&root.join("docs/a/b/c.md"), root));
        assert!(!spec.matches(&root.join("docs/a/b/c.txt"), root));
    }

    #[test]
    fn later_sources_take_precedence() {
        let root = Path::new("/project");
        let spec = IgnoreSpec::from_sources(
            root,
            &["!important.log".to_string(), "*.log".to_string()],
        );

        assert!(spec.matches(&root.join("important.log"), root));
    }

    #[test]
    fn empty_spec_ignores_nothing() {
        let root = Path::new("/project");
        let spec = IgnoreSpec::empty();

        assert!(spec.is_empty());
        assert!(!spec.matches(&root.join("anything.log"), root));
    }
}
