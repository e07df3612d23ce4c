//! `--list-tools`: print the registered packagers

use anyhow::Result;

use build_tools::packager::PackagerRegistry;

/// Print each packager with its descriptor extension
pub fn execute() -> Result<()> {
    let registry = PackagerRegistry::builtin();
    for packager in registry.iter() {
        println!("{:<10} *.{}", packager.name(), packager.extension());
    }
    Ok(())
}
