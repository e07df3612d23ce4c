//! # Include Aggregation
//!
//! Expands the `include` and `config` entries of a descriptor into concrete
//! files. Each entry is one of:
//!
//! - **Glob** (`plugins/*.cfg`, `libs\acme*.dll`): the text before the single
//!   `*` names a directory plus an optional file-name prefix, the text after
//!   it is a file-name suffix. Files are matched recursively.
//! - **Directory** (`assets`): every file beneath it, recursively.
//! - **Literal** (`docs/readme.txt`): one file, staged under its own name.
//!
//! Every match remembers the base directory it was found from, so the staged
//! path keeps the structure below that base: `plugins/a/b/c.cfg` matched by
//! `plugins\*` is staged as `a/b/c.cfg`.
//!
//! Backslashes are accepted as path separators on every platform.

use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::error::{Error, Result};

pub const WILDCARD: char = '*';

/// One classified include/config token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeSpec {
    /// A single file; its parent is the base directory
    Literal(PathBuf),
    /// Every file beneath the directory
    Directory(PathBuf),
    /// Files beneath `dir` whose name is `prefix*suffix`
    Glob {
        dir: PathBuf,
        prefix: String,
        suffix: String,
    },
}

/// A matched file and the base directory its staged path is relative to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    base: PathBuf,
    path: PathBuf,
    relative: PathBuf,
}

impl ResolvedFile {
    pub fn new(base: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        let path = path.into();
        let relative = path
            .strip_prefix(&base)
            .map_err(|_| Error::Filesystem {
                message: format!(
                    "'{}' is not below its base directory '{}'",
                    path.display(),
                    base.display()
                ),
            })?
            .to_path_buf();

        Ok(Self {
            base,
            path,
            relative,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Full path of the source file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path below the base directory, used as the staged location
    pub fn relative_path(&self) -> &Path {
        &self.relative
    }
}

impl IncludeSpec {
    /// Classify a token relative to the descriptor root
    pub fn classify(root: &Path, token: &str) -> Self {
        let token = normalize_separators(token);

        if let Some((before, after)) = token.split_once(WILDCARD) {
            let (dir, prefix) = match before.rfind('/') {
                Some(index) => (&before[..index], &before[index + 1..]),
                None => ("", before),
            };
            return IncludeSpec::Glob {
                dir: root.join(dir),
                prefix: prefix.to_string(),
                suffix: after.to_string(),
            };
        }

        let path = root.join(&token);
        if path.is_dir() {
            IncludeSpec::Directory(path)
        } else {
            IncludeSpec::Literal(path)
        }
    }

    /// List the files this entry refers to
    pub fn expand(&self) -> Result<Vec<ResolvedFile>> {
        match self {
            IncludeSpec::Literal(path) => {
                if !path.is_file() {
                    return Err(Error::MissingSource { path: path.clone() });
                }
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                Ok(vec![ResolvedFile::new(base, path)?])
            }
            IncludeSpec::Directory(dir) => walk_files(dir, |_| true),
            IncludeSpec::Glob {
                dir,
                prefix,
                suffix,
            } => {
                if !dir.is_dir() {
                    return Err(Error::MissingSource { path: dir.clone() });
                }
                let pattern = Pattern::new(&format!(
                    "{}*{}",
                    Pattern::escape(prefix),
                    Pattern::escape(suffix)
                ))?;
                walk_files(dir, |name| pattern.matches(name))
            }
        }
    }
}

/// Expand every token in order, relative to the descriptor root
pub fn aggregate<S: AsRef<str>>(root: &Path, tokens: &[S]) -> Result<Vec<ResolvedFile>> {
    let mut files = Vec::new();
    for token in tokens {
        let spec = IncludeSpec::classify(root, token.as_ref());
        files.extend(spec.expand()?);
    }
    Ok(files)
}

/// Replace `\` with `/` so descriptors written on Windows resolve everywhere
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

fn walk_files<F>(dir: &Path, mut accept: F) -> Result<Vec<ResolvedFile>>
where
    F: FnMut(&str) -> bool,
{
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        // Names that are not UTF-8 are matched in their lossy form.
        let name = entry.file_name().to_string_lossy();
        if accept(&name) {
            files.push(ResolvedFile::new(dir, entry.path())?);
        }
    }

    Ok(files)
}
