use anyhow::Result;
use picopip::{Config, SiteDirectory, Snapshot};
use std::path::PathBuf;

pub fn run(target: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;
    let target = target.unwrap_or(config.install.target);
    let site = SiteDirectory::new(&target);

    let snapshot = Snapshot::from_site(&site)?;
    println!("{}", snapshot.to_json()?);
    Ok(())
}
