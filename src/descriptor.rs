//! # Descriptor Parsing
//!
//! A descriptor is a line-oriented `key: value` file describing one package:
//!
//! ```text
//! # acme plugin
//! name: acme
//! target: bin/%name%.dll
//! include: plugins\*;readme.txt
//! flags: NO_STRUCTURE
//! ```
//!
//! Parsing rules:
//!
//! - Everything from the first `#` to the end of a line is a comment.
//! - Lines that are empty after comment stripping are skipped.
//! - The key is the trimmed text before the first `:`. The value is every
//!   remaining segment joined back with `:` and trimmed, so values such as
//!   `12:30:00` survive.
//! - A line without `:`, or with nothing before it, is a
//!   [`Error::MalformedLine`].
//! - A leading UTF-8 byte order mark is ignored.
//! - Keys are unique. A repeated key overwrites the earlier value but keeps
//!   its original position.
//!
//! List-valued keys (`include`, `config`, `flags`) are read with
//! [`Descriptor::list`], which splits on `;`.

use std::path::Path;

use crate::error::{Error, Result};

pub const NAME: &str = "name";
pub const VERSION: &str = "version";
pub const TARGET: &str = "target";
pub const OUTPUT: &str = "output";
pub const INCLUDE: &str = "include";
pub const CONFIG: &str = "config";
pub const DEPENDENCY: &str = "dependency";
pub const FLAGS: &str = "flags";
pub const ORIGIN: &str = "origin";
pub const BUILD_COMMAND: &str = "buildcmd";
pub const SOLUTION: &str = "solution";

/// Every key the packaging pipeline reads. Other keys are kept as plain
/// substitution sources.
pub const RECOGNIZED_KEYS: [&str; 11] = [
    NAME,
    VERSION,
    TARGET,
    OUTPUT,
    INCLUDE,
    CONFIG,
    DEPENDENCY,
    FLAGS,
    ORIGIN,
    BUILD_COMMAND,
    SOLUTION,
];

pub const COMMENT_MARKER: char = '#';
pub const KEY_VALUE_SEPARATOR: char = ':';
pub const LIST_SEPARATOR: char = ';';

/// Written at the start of UTF-8 files by some Windows editors
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Ordered key/value mapping read from a descriptor file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    entries: Vec<(String, String)>,
}

impl Descriptor {
    /// Create an empty descriptor
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse descriptor text
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
        Self::from_lines(text.lines())
    }

    /// Parse a sequence of descriptor lines
    pub fn from_lines<'a, I>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut descriptor = Self::new();

        for (index, raw) in lines.into_iter().enumerate() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once(KEY_VALUE_SEPARATOR)
                .map(|(key, value)| (key.trim(), value.trim()))
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| Error::MalformedLine {
                    line: index + 1,
                    content: raw.to_string(),
                })?;

            descriptor.insert(key, value);
        }

        Ok(descriptor)
    }

    /// Read and parse a descriptor file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the key is defined
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or overwrite a value. An overwritten key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Split a list-valued key into its tokens. An absent key yields an
    /// empty list.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(parse_list).unwrap_or_default()
    }

    /// Iterate over entries in descriptor order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys in descriptor order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [(String, String)] {
        &mut self.entries
    }
}

/// Split a list value on `;` into trimmed, non-empty tokens
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_MARKER) {
        Some(index) => &line[..index],
        None => line,
    }
}
