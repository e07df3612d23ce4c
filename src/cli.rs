//! CLI argument parsing, logging setup and dispatch

use anyhow::Result;
use clap::Parser;

use crate::commands;

/// Build Tools - package build artifacts from descriptor files
#[derive(Parser, Debug)]
#[command(name = "build-tools")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    package: commands::package::PackageArgs,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(
        long,
        value_name = "LEVEL",
        env = "BUILD_TOOLS_LOG",
        default_value = "info"
    )]
    log_level: String,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        if self.package.list_tools {
            return commands::tools::execute();
        }
        commands::package::execute(self.package)
    }
}

/// Route `log` records to stderr, filtered by the `--log-level` value.
/// Accepts full `env_logger` filter syntax, e.g. `warn,build_tools=debug`.
fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder
        .parse_filters(level)
        .format_timestamp(None)
        .format_target(false);
    // A logger may already be installed when running inside tests.
    let _ = builder.try_init();
}
