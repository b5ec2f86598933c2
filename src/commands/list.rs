use anyhow::Result;
use picopip::{Config, SiteDirectory};
use std::path::PathBuf;

pub fn run(target: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;
    let target = target.unwrap_or(config.install.target);
    let site = SiteDirectory::new(&target);

    let records = site.installed_records()?;
    if records.is_empty() {
        println!("No packages installed in {}", target.display());
        return Ok(());
    }

    println!("Installed packages in {}:", target.display());
    for record in records {
        println!("  {} {}", record.name, record.version);
    }
    Ok(())
}
