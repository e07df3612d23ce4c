//! # Packagers and Batch Runs
//!
//! A [`Packager`] is one named variant of the packaging pipeline, identified
//! by the file extension of its descriptors. The application and plugin
//! packagers differ only in those two values, so both are plain data in a
//! [`PackagerRegistry`] built at startup.
//!
//! Running a packager on a descriptor file executes the full pipeline and
//! stops at the first error:
//!
//! 1. parse the descriptor ([`Descriptor::from_file`])
//! 2. resolve `%key%` placeholders ([`resolve`])
//! 3. run the optional build command ([`build::invoke`])
//! 4. compute the package plan and aggregate files ([`PackageSpec::from_descriptor`])
//! 5. stage and compress ([`package`])
//!
//! Running it on a directory packages every descriptor with the packager's
//! extension below that directory, one after another. A failing descriptor is
//! logged and recorded in the [`BatchReport`]; the batch itself still
//! succeeds.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use walkdir::WalkDir;

use crate::build::{self, BuildMode, LogSink, ProgressSink};
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::package::{package, PackageOutcome, PackageSpec};
use crate::resolve::{resolve, ResolveMode};

/// Per-run settings, passed explicitly through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub resolve_mode: ResolveMode,
    pub build_mode: BuildMode,
    /// Parent of the `<name>_build` staging directories
    pub staging_root: PathBuf,
    /// Anchor for the default `build/<name>.zip` output
    pub working_dir: PathBuf,
}

impl RunOptions {
    /// Strict resolution, blocking builds, staging under the system temp dir
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolve_mode: ResolveMode::default(),
            build_mode: BuildMode::default(),
            staging_root: std::env::temp_dir(),
            working_dir: working_dir.into(),
        }
    }

    pub fn with_resolve_mode(mut self, mode: ResolveMode) -> Self {
        self.resolve_mode = mode;
        self
    }

    pub fn with_build_mode(mut self, mode: BuildMode) -> Self {
        self.build_mode = mode;
        self
    }

    pub fn with_staging_root(mut self, staging_root: impl Into<PathBuf>) -> Self {
        self.staging_root = staging_root.into();
        self
    }
}

/// A descriptor that failed during a batch run
#[derive(Debug)]
pub struct BatchFailure {
    pub descriptor: PathBuf,
    pub error: Error,
}

/// Outcome of a packager run over one or more descriptors
#[derive(Debug, Default)]
pub struct BatchReport {
    pub packaged: Vec<PackageOutcome>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A named packaging pipeline bound to a descriptor extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packager {
    name: String,
    extension: String,
}

impl Packager {
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor file extension, without the leading dot
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether the path has this packager's descriptor extension
    pub fn matches(&self, path: &Path) -> bool {
        path.extension() == Some(OsStr::new(&self.extension))
    }

    /// Package a descriptor file, or every descriptor below a directory
    pub fn run(&self, path: &Path, options: &RunOptions) -> Result<BatchReport> {
        if path.is_dir() {
            return self.run_batch(path, options);
        }

        let outcome = self.package_descriptor(path, options)?;
        Ok(BatchReport {
            packaged: vec![outcome],
            failures: Vec::new(),
        })
    }

    /// Package every descriptor below `dir`, continuing past failures
    pub fn run_batch(&self, dir: &Path, options: &RunOptions) -> Result<BatchReport> {
        let descriptors = self.discover(dir)?;
        info!(
            "Found {} {} descriptor(s) in {}",
            descriptors.len(),
            self.name,
            dir.display()
        );

        let mut report = BatchReport::default();
        for descriptor in descriptors {
            match self.package_descriptor(&descriptor, options) {
                Ok(outcome) => report.packaged.push(outcome),
                Err(e) => {
                    error!("{}: {}", descriptor.display(), e);
                    report.failures.push(BatchFailure {
                        descriptor,
                        error: e,
                    });
                }
            }
        }

        Ok(report)
    }

    /// Descriptor files below `dir`, in file-name order. Entries that
    /// cannot be read are logged and skipped; only an unreadable `dir`
    /// itself is an error.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable entry while scanning {}: {}", dir.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && self.matches(entry.path()) {
                found.push(entry.into_path());
            }
        }
        Ok(found)
    }

    /// Run the full pipeline for one descriptor, streaming build output to
    /// the log
    pub fn package_descriptor(&self, path: &Path, options: &RunOptions) -> Result<PackageOutcome> {
        self.package_descriptor_with_sink(path, options, &mut LogSink)
    }

    pub fn package_descriptor_with_sink(
        &self,
        path: &Path,
        options: &RunOptions,
        sink: &mut dyn ProgressSink,
    ) -> Result<PackageOutcome> {
        info!("Running descriptor: {}", path.display());

        let path = std::path::absolute(path)?;
        let root = path.parent().unwrap_or_else(|| Path::new("/")).to_path_buf();

        let mut descriptor = Descriptor::from_file(&path)?;
        resolve(&mut descriptor, options.resolve_mode)?;
        build::invoke(&descriptor, &root, options.build_mode, sink)?;

        let spec = PackageSpec::from_descriptor(&descriptor, &path, &root, &options.working_dir)?;
        package(&spec, &options.staging_root)
    }
}

/// The packagers available to the CLI
#[derive(Debug, Clone, Default)]
pub struct PackagerRegistry {
    packagers: Vec<Packager>,
}

impl PackagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `plugin` (`*.build`) and `app` (`*.appbuild`)
    /// packagers
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Packager::new("plugin", "build"));
        registry.register(Packager::new("app", "appbuild"));
        registry
    }

    /// Add a packager, replacing one with the same name
    pub fn register(&mut self, packager: Packager) {
        self.packagers.retain(|p| p.name != packager.name);
        self.packagers.push(packager);
    }

    pub fn find(&self, name: &str) -> Option<&Packager> {
        self.packagers.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.packagers.iter().map(Packager::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Packager> {
        self.packagers.iter()
    }
}
