//! Shared test utilities for E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_file("acme.dll", "binary")
//!         .with_descriptor("acme.build", descriptors::MINIMAL);
//!     fixture.command().arg("plugin").arg("acme.build").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::io::Read;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::descriptors;
    #[allow(unused_imports)]
    pub use super::{archive_entries, archive_text};
    pub use super::TestFixture;
}

/// Descriptor snippets for testing.
#[allow(dead_code)]
pub mod descriptors {
    /// Only the keys packaging requires.
    pub const MINIMAL: &str = "name: acme\ntarget: acme.dll\noutput: out/acme.zip\n";

    /// The acme plugin with Windows-style separators.
    pub const ACME: &str = r"# acme plugin
name: acme
target: %name%.dll
include: plugins\*
output: out\%name%.zip
";

    /// The acme plugin packaged without subfolders.
    pub const ACME_FLAT: &str = r"name: acme
target: acme.dll
include: plugins\*
output: out\acme.zip
flags: NO_STRUCTURE
";
}

/// A test fixture that provides a temporary project directory and a separate
/// staging directory, so parallel tests never share `<name>_build` folders.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
    staging_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with empty temporary directories.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
            staging_dir: assert_fs::TempDir::new().expect("Failed to create staging directory"),
        }
    }

    /// Add a descriptor file with the given content.
    pub fn with_descriptor(self, path: &str, content: &str) -> Self {
        self.with_file(path, content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the project directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the staging directory.
    #[allow(dead_code)]
    pub fn staging_path(&self) -> &Path {
        self.staging_dir.path()
    }

    /// Create a child path in the project directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command running in the project directory with the fixture's
    /// staging directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("build-tools");
        cmd.current_dir(self.path())
            .env("BUILD_TOOLS_STAGING_DIR", self.staging_path())
            .env_remove("BUILD_TOOLS_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorted entry names of a zip archive.
#[allow(dead_code)]
pub fn archive_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).expect("Failed to open archive");
    let archive = zip::ZipArchive::new(file).expect("Failed to read archive");
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// Text content of one archive entry.
#[allow(dead_code)]
pub fn archive_text(path: &Path, entry: &str) -> String {
    let file = std::fs::File::open(path).expect("Failed to open archive");
    let mut archive = zip::ZipArchive::new(file).expect("Failed to read archive");
    let mut content = String::new();
    archive
        .by_name(entry)
        .expect("Entry not in archive")
        .read_to_string(&mut content)
        .expect("Failed to read entry");
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dirs() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
        assert!(fixture.staging_path().exists());
        assert_ne!(fixture.path(), fixture.staging_path());
    }

    #[test]
    fn test_fixture_with_file() {
        let fixture = TestFixture::new().with_file("sub/test.txt", "hello");
        assert!(fixture.path().join("sub/test.txt").exists());
    }
}
