//! # Build Tools Library
//!
//! This library packages build artifacts described by small declarative
//! descriptor files. It backs the `build-tools` command-line tool but can be
//! used directly by other build scripts.
//!
//! ## Quick Example
//!
//! ```
//! use build_tools::descriptor::Descriptor;
//! use build_tools::resolve::{resolve, ResolveMode};
//!
//! let text = "name: acme\ntarget: %name%.dll  # main binary\ninclude: plugins\\*;readme.txt\n";
//! let mut descriptor = Descriptor::parse(text).unwrap();
//! resolve(&mut descriptor, ResolveMode::Strict).unwrap();
//!
//! assert_eq!(descriptor.get("target"), Some("acme.dll"));
//! assert_eq!(descriptor.list("include"), vec!["plugins\\*", "readme.txt"]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Descriptors (`descriptor`)**: `key: value` lines with `#` comments and
//!   `;`-separated lists.
//! - **Resolution (`resolve`)**: `%key%` placeholders expanded to a fixed
//!   point, with cycle detection.
//! - **Includes (`include`)**: literal files, directories, and `prefix*suffix`
//!   globs expanded into files with a base directory each.
//! - **Build step (`build`)**: an optional external command run before
//!   packaging.
//! - **Packaging (`package`)**: staging layout, `info.txt` manifest, and zip
//!   archive creation.
//! - **Packagers (`packager`)**: named pipeline variants keyed by descriptor
//!   extension, with a batch mode for whole directories.
//!
//! ## Execution Flow
//!
//! For each descriptor, [`packager::Packager`] runs:
//!
//! 1.  **Parse** the descriptor file.
//! 2.  **Resolve** placeholders.
//! 3.  **Build** with the configured command, if any.
//! 4.  **Aggregate** include and config files.
//! 5.  **Stage** files into `bin/` and `config/` (or flat).
//! 6.  **Archive** the staging directory and clean it up.

pub mod build;
pub mod descriptor;
pub mod error;
pub mod include;
pub mod package;
pub mod packager;
pub mod resolve;
pub mod suggestions;
pub mod version;

#[cfg(test)]
mod descriptor_proptest;
