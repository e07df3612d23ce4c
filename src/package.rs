//! # Staging and Packaging
//!
//! Turns a resolved descriptor into a zip archive:
//!
//! 1. [`PackageSpec::from_descriptor`] computes the target binary, package
//!    name, version, output path, manifest fields, flags, and the aggregated
//!    include/config files.
//! 2. [`package`] allocates `<name>_build` under the staging root, removing a
//!    stale copy left by an earlier failed run.
//! 3. Files are copied into the layout. The structured layout puts the target
//!    and include files in `bin/` and config files in `config/`. With
//!    `NO_STRUCTURE` everything lands in the staging root.
//! 4. The manifest `name|target|origin|version|dependencies` is written to
//!    `info.txt` unless `NO_INFO` is set, and next to the archive as
//!    `<archive>.info.txt` when `INFO_TO_OUTPUT` is set.
//! 5. The staging directory is zipped into the output path, replacing any
//!    existing archive, and then removed.
//!
//! When any step fails the staging directory is left in place so its contents
//! can be inspected.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::descriptor::{self, Descriptor};
use crate::error::{Error, Result};
use crate::include::{self, normalize_separators, ResolvedFile};
use crate::suggestions;
use crate::version;

pub const MANIFEST_FILE: &str = "info.txt";
pub const BINARIES_DIR: &str = "bin";
pub const CONFIGS_DIR: &str = "config";
pub const DEFAULT_OUTPUT_DIR: &str = "build";
pub const ARCHIVE_EXTENSION: &str = "zip";
pub const STAGING_SUFFIX: &str = "_build";
pub const MANIFEST_SEPARATOR: char = '|';

/// Behaviour switches read from the `flags` key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageFlags {
    /// Put every file directly in the archive root
    pub flatten: bool,
    /// Leave `info.txt` out of the archive
    pub omit_manifest: bool,
    /// Also write the manifest next to the archive
    pub manifest_beside_output: bool,
}

impl PackageFlags {
    pub const NO_STRUCTURE: &'static str = "NO_STRUCTURE";
    pub const NO_INFO: &'static str = "NO_INFO";
    pub const INFO_TO_OUTPUT: &'static str = "INFO_TO_OUTPUT";
    pub const ALL: [&'static str; 3] = [Self::NO_STRUCTURE, Self::NO_INFO, Self::INFO_TO_OUTPUT];

    /// Build the flag set from `flags` tokens. Matching ignores ASCII case;
    /// unknown tokens are logged and skipped.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut flags = Self::default();
        for token in tokens {
            let token = token.as_ref();
            if token.eq_ignore_ascii_case(Self::NO_STRUCTURE) {
                flags.flatten = true;
            } else if token.eq_ignore_ascii_case(Self::NO_INFO) {
                flags.omit_manifest = true;
            } else if token.eq_ignore_ascii_case(Self::INFO_TO_OUTPUT) {
                flags.manifest_beside_output = true;
            } else {
                warn!(
                    "Ignoring unknown flag '{}'{}",
                    token,
                    suggestions::did_you_mean(token, &Self::ALL)
                );
            }
        }
        flags
    }

    pub fn layout(&self) -> Layout {
        if self.flatten {
            Layout::Flat
        } else {
            Layout::Structured
        }
    }
}

/// Directory layout inside the staging root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `bin/` for the target and includes, `config/` for configs
    Structured,
    /// Everything in the root
    Flat,
}

impl Layout {
    pub fn binaries_dir(&self, staging: &Path) -> PathBuf {
        match self {
            Layout::Structured => staging.join(BINARIES_DIR),
            Layout::Flat => staging.to_path_buf(),
        }
    }

    pub fn configs_dir(&self, staging: &Path) -> PathBuf {
        match self {
            Layout::Structured => staging.join(CONFIGS_DIR),
            Layout::Flat => staging.to_path_buf(),
        }
    }
}

/// Pipe-delimited package record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub target_file_name: String,
    pub origin: String,
    pub version: String,
    pub dependencies: String,
}

impl Manifest {
    pub fn render(&self) -> String {
        [
            self.name.as_str(),
            self.target_file_name.as_str(),
            self.origin.as_str(),
            self.version.as_str(),
            self.dependencies.as_str(),
        ]
        .join(&MANIFEST_SEPARATOR.to_string())
    }
}

impl std::fmt::Display for Manifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Everything needed to stage and archive one descriptor
#[derive(Debug, Clone)]
pub struct PackageSpec {
    /// Directory containing the descriptor; relative paths start here
    pub root: PathBuf,
    pub name: String,
    pub target: PathBuf,
    pub version: String,
    pub output: PathBuf,
    pub dependency: String,
    pub origin: String,
    pub flags: PackageFlags,
    pub includes: Vec<ResolvedFile>,
    pub configs: Vec<ResolvedFile>,
}

impl PackageSpec {
    /// Compute the package plan from a resolved descriptor.
    ///
    /// `root` is the descriptor's directory and `working_dir` anchors the
    /// default `build/<name>.zip` output.
    pub fn from_descriptor(
        descriptor: &Descriptor,
        descriptor_path: &Path,
        root: &Path,
        working_dir: &Path,
    ) -> Result<Self> {
        let required = |key: &str| {
            descriptor
                .get(key)
                .map(str::to_string)
                .ok_or_else(|| Error::MissingKey {
                    key: key.to_string(),
                    path: descriptor_path.to_path_buf(),
                })
        };

        let name = required(descriptor::NAME)?;
        let target = root.join(normalize_separators(&required(descriptor::TARGET)?));
        if !target.is_file() {
            return Err(Error::MissingSource { path: target });
        }

        let version = match descriptor.get(descriptor::VERSION) {
            Some(version) => version.to_string(),
            None => version::product_version(&target)?.unwrap_or_default(),
        };

        let output = match descriptor.get(descriptor::OUTPUT) {
            Some(output) => root.join(normalize_separators(output)),
            None => working_dir
                .join(DEFAULT_OUTPUT_DIR)
                .join(format!("{}.{}", name, ARCHIVE_EXTENSION)),
        };

        Ok(Self {
            root: root.to_path_buf(),
            includes: include::aggregate(root, &descriptor.list(descriptor::INCLUDE))?,
            configs: include::aggregate(root, &descriptor.list(descriptor::CONFIG))?,
            flags: PackageFlags::from_tokens(&descriptor.list(descriptor::FLAGS)),
            dependency: descriptor
                .get(descriptor::DEPENDENCY)
                .unwrap_or_default()
                .to_string(),
            origin: descriptor
                .get(descriptor::ORIGIN)
                .unwrap_or_default()
                .to_string(),
            name,
            target,
            version,
            output,
        })
    }

    pub fn target_file_name(&self) -> String {
        self.target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn manifest(&self) -> Manifest {
        Manifest {
            name: self.name.clone(),
            target_file_name: self.target_file_name(),
            origin: self.origin.clone(),
            version: self.version.clone(),
            dependencies: self.dependency.clone(),
        }
    }

    /// `<staging_root>/<name>_build`
    pub fn staging_dir(&self, staging_root: &Path) -> PathBuf {
        staging_root.join(format!("{}{}", self.name, STAGING_SUFFIX))
    }

    /// `<output dir>/<archive stem>.info.txt`
    pub fn external_manifest_path(&self) -> PathBuf {
        let stem = self
            .output
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone());
        self.output.with_file_name(format!("{}.{}", stem, MANIFEST_FILE))
    }
}

/// Result of a successful packaging run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
    pub archive: PathBuf,
    /// Manifest written beside the archive, if requested
    pub external_manifest: Option<PathBuf>,
    /// Number of staged files, target included
    pub files: usize,
    /// Staged files that replaced another file at the same destination
    pub replaced: usize,
}

/// What [`stage`] copied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Staged {
    pub files: usize,
    pub replaced: usize,
}

/// Stage, describe and compress one package
pub fn package(spec: &PackageSpec, staging_root: &Path) -> Result<PackageOutcome> {
    if let Some(parent) = spec.output.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
            message: format!("Failed to create directory '{}': {}", parent.display(), e),
        })?;
    }

    let staging = prepare_staging(&spec.staging_dir(staging_root))?;
    let mut staged = stage(spec, &staging)?;

    info!("Writing package info");
    let manifest = spec.manifest().render();
    if !spec.flags.omit_manifest {
        let path = staging.join(MANIFEST_FILE);
        if path.exists() {
            warn!("Package info replaces staged file {}", path.display());
            staged.replaced += 1;
        }
        fs::write(path, &manifest)?;
    }
    let external_manifest = if spec.flags.manifest_beside_output {
        let path = spec.external_manifest_path();
        fs::write(&path, &manifest)?;
        Some(path)
    } else {
        None
    };

    if spec.output.exists() {
        fs::remove_file(&spec.output)?;
    }
    compress(&staging, &spec.output)?;

    fs::remove_dir_all(&staging)?;
    info!(
        "Finished building {} -> {}",
        spec.name,
        spec.output.display()
    );

    Ok(PackageOutcome {
        archive: spec.output.clone(),
        external_manifest,
        files: staged.files,
        replaced: staged.replaced,
    })
}

/// Create an empty staging directory, deleting a stale one
pub fn prepare_staging(staging: &Path) -> Result<PathBuf> {
    if staging.exists() {
        debug!("Removing stale staging directory {}", staging.display());
        fs::remove_dir_all(staging)?;
    }
    fs::create_dir_all(staging)?;
    Ok(staging.to_path_buf())
}

/// Copy all package files into the staging directory.
///
/// Include and config files that land on the same destination are copied in
/// order, the later one wins with a warning. The target binary always
/// overwrites a same-named include silently.
pub fn stage(spec: &PackageSpec, staging: &Path) -> Result<Staged> {
    let layout = spec.flags.layout();
    let binaries = layout.binaries_dir(staging);
    let configs = layout.configs_dir(staging);
    fs::create_dir_all(&binaries)?;
    fs::create_dir_all(&configs)?;

    info!(
        "Copying {} files",
        spec.includes.len() + spec.configs.len()
    );
    let replaced = copy_files(&spec.includes, &binaries)? + copy_files(&spec.configs, &configs)?;

    let target = binaries.join(spec.target_file_name());
    copy_file(&spec.target, &target)?;

    Ok(Staged {
        files: spec.includes.len() + spec.configs.len() + 1,
        replaced,
    })
}

/// Returns how many copies replaced an already staged file
fn copy_files(files: &[ResolvedFile], destination: &Path) -> Result<usize> {
    let mut replaced = 0;
    for file in files {
        let target = destination.join(file.relative_path());
        if target.exists() {
            warn!(
                "{} replaces an already staged file at {}",
                file.path().display(),
                target.display()
            );
            replaced += 1;
        }
        copy_file(file.path(), &target)?;
    }
    Ok(replaced)
}

fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    debug!("Copying {} -> {}", source.display(), destination.display());
    fs::copy(source, destination).map_err(|e| Error::Filesystem {
        message: format!(
            "Failed to copy '{}' to '{}': {}",
            source.display(),
            destination.display(),
            e
        ),
    })?;
    Ok(())
}

/// Zip the contents of `source_dir` into `output`
pub fn compress(source_dir: &Path, output: &Path) -> Result<()> {
    let file = File::create(output).map_err(|e| Error::Filesystem {
        message: format!("Failed to create archive '{}': {}", output.display(), e),
    })?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| Error::Filesystem {
                message: format!("Failed to make path relative: {}", entry.path().display()),
            })?;
        let name = archive_name(relative);

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
        } else {
            zip.start_file(name, options)?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, &mut zip)?;
        }
    }

    zip.finish()?;
    Ok(())
}

/// Forward-slash entry name for a relative path
fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
