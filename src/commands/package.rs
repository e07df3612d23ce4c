//! # Package Command Implementation
//!
//! Runs one registered packager on a descriptor file or on a directory of
//! descriptors:
//!
//! - A file is packaged fail-fast; the first error ends the run with exit
//!   code 1.
//! - A directory is scanned recursively for the packager's extension. Each
//!   descriptor is packaged independently; failures are reported and the run
//!   still succeeds.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use build_tools::build::BuildMode;
use build_tools::packager::{PackagerRegistry, RunOptions};
use build_tools::resolve::ResolveMode;
use build_tools::suggestions;

/// Arguments for packaging
#[derive(Args, Debug)]
pub struct PackageArgs {
    /// Packager to run (see --list-tools)
    #[arg(value_name = "TOOL", required_unless_present = "list_tools")]
    pub tool: Option<String>,

    /// Descriptor file, or a directory to scan for descriptors
    #[arg(value_name = "PATH", required_unless_present = "list_tools")]
    pub paths: Vec<PathBuf>,

    /// Keep partially resolved values when a %variable% is undefined
    /// instead of failing (legacy behaviour)
    #[arg(long)]
    pub best_effort: bool,

    /// Stream the build command's output line by line into the log
    #[arg(long)]
    pub stream: bool,

    /// Directory that holds the temporary <name>_build staging folders
    #[arg(long, value_name = "PATH", env = "BUILD_TOOLS_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Suppress the summary, only errors are printed
    #[arg(short, long)]
    pub quiet: bool,

    /// List the registered packagers and exit
    #[arg(long)]
    pub list_tools: bool,
}

/// Execute the package command
pub fn execute(args: PackageArgs) -> Result<()> {
    let registry = PackagerRegistry::builtin();

    let tool = args.tool.as_deref().unwrap_or_default();
    let packager = registry
        .find(tool)
        .ok_or_else(|| suggestions::unknown_tool(tool, &registry.names()))?;

    let Some(path) = args.paths.first() else {
        anyhow::bail!("No descriptor path given");
    };
    if args.paths.len() > 1 {
        eprintln!(
            "Invalid argument: expected one descriptor file or directory, got {}; using {}",
            args.paths.len(),
            path.display()
        );
    }
    if !path.exists() {
        return Err(suggestions::descriptor_not_found(path, packager.extension()));
    }

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let mut options = RunOptions::new(working_dir)
        .with_resolve_mode(if args.best_effort {
            ResolveMode::BestEffort
        } else {
            ResolveMode::Strict
        })
        .with_build_mode(if args.stream {
            BuildMode::Streaming
        } else {
            BuildMode::Blocking
        });
    if let Some(staging_dir) = args.staging_dir {
        options = options.with_staging_root(staging_dir);
    }

    let report = packager
        .run(path, &options)
        .with_context(|| format!("Failed to package {}", path.display()))?;

    if !args.quiet {
        for outcome in &report.packaged {
            println!("Packaged {}", outcome.archive.display());
        }
        for failure in &report.failures {
            println!("Failed {}: {}", failure.descriptor.display(), failure.error);
        }
        println!(
            "{} packaged, {} failed",
            report.packaged.len(),
            report.failures.len()
        );
    }

    Ok(())
}
