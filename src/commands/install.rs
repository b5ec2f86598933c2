use anyhow::Result;
use picopip::{install_requirements, Config, HttpIndex, SiteDirectory, TransactionOptions};
use std::path::PathBuf;

pub fn run(
    requirements: Vec<String>,
    pre: bool,
    no_deps: bool,
    keep_going: bool,
    index_url: Option<String>,
    target: Option<PathBuf>,
) -> Result<()> {
    if requirements.is_empty() {
        println!("Nothing to install.");
        println!();
        println!("Usage: picopip install <requirement>...");
        return Ok(());
    }

    let config = Config::load()?;
    let index_url = index_url.unwrap_or_else(|| config.index.url.clone());
    let target = target.unwrap_or_else(|| config.install.target.clone());

    let index = HttpIndex::new(&index_url)?;
    let platform = config.target_platform()?;
    let site = SiteDirectory::new(&target);
    let options = TransactionOptions {
        deps: !no_deps && config.install.deps,
        pre: pre || config.install.pre,
        keep_going,
    };

    println!("Resolving {} requirement(s)...", requirements.len());
    let wheels = install_requirements(&index, &platform, &site, &requirements, options)?;

    if wheels.is_empty() {
        println!("Requirements already satisfied.");
        return Ok(());
    }
    for wheel in &wheels {
        println!("  ✓ {} {}", wheel.name, wheel.version);
    }
    println!();
    println!(
        "✓ Installed {} package(s) into {}",
        wheels.len(),
        target.display()
    );
    Ok(())
}
