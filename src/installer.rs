//! Installing wheels into a target directory
//!
//! A [`SiteDirectory`] is a plain directory laid out like a Python
//! site-packages: package code at the top level and one
//! `*.dist-info/` directory per installed distribution. Next to the
//! files the wheel ships, each install writes a `picopip.json` record so
//! later runs (and `freeze`) know what is present, what it depends on and
//! which modules it provides.

use crate::platform::Platform;
use crate::registry::Index;
use crate::transaction::{Transaction, TransactionOptions};
use crate::wheel::{normalize_name, WheelInfo};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

pub const RECORD_FILE: &str = "picopip.json";

/// Per-distribution install record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRecord {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
    /// Where the wheel came from: a URL, or `"mock"`.
    pub source: String,
}

pub struct SiteDirectory {
    root: PathBuf,
}

impl SiteDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Records for everything installed in this directory.
    ///
    /// Distributions without a `picopip.json` (installed by other tools)
    /// are reported with name and version taken from the `.dist-info`
    /// directory name.
    pub fn installed_records(&self) -> Result<Vec<InstallRecord>> {
        let mut records = Vec::new();
        if !self.root.is_dir() {
            return Ok(records);
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let dirname = entry.file_name().to_string_lossy().to_string();
            let Some(stem) = dirname.strip_suffix(".dist-info") else {
                continue;
            };
            if !entry.path().is_dir() {
                continue;
            }
            let record_path = entry.path().join(RECORD_FILE);
            if record_path.is_file() {
                let record: InstallRecord = serde_json::from_str(&fs::read_to_string(record_path)?)?;
                records.push(record);
            } else if let Some((name, version)) = stem.rsplit_once('-') {
                records.push(InstallRecord {
                    name: normalize_name(name),
                    version: version.to_string(),
                    depends: Vec::new(),
                    imports: vec![name.to_string()],
                    source: "unknown".to_string(),
                });
            }
        }
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    /// The installed version of a package, if any.
    pub fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let name = normalize_name(name);
        Ok(self
            .installed_records()?
            .into_iter()
            .find(|r| r.name == name)
            .map(|r| r.version))
    }

    /// Unpack a fetched wheel into the directory and write its record.
    ///
    /// Installing a name+version that is already present is a no-op.
    pub fn install(&self, wheel: &WheelInfo) -> Result<()> {
        let version = wheel.version.to_string();
        if self.installed_version(&wheel.name)?.as_deref() == Some(version.as_str()) {
            tracing::debug!(package = %wheel.name, %version, "already installed");
            return Ok(());
        }
        fs::create_dir_all(&self.root)?;

        let mut archive = zip::ZipArchive::new(Cursor::new(wheel.data.as_slice()))?;
        let mut dist_info: Option<PathBuf> = None;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let Some(rel) = entry.enclosed_name().map(Path::to_path_buf) else {
                return Err(Error::InvalidMetadata(format!(
                    "refusing to unpack unsafe path '{}' from {}",
                    entry.name(),
                    wheel.filename
                )));
            };
            if let Some(first) = rel.components().next() {
                let first = first.as_os_str().to_string_lossy();
                if first.ends_with(".dist-info") {
                    dist_info = Some(self.root.join(first.as_ref()));
                }
            }
            let dest = self.root.join(&rel);
            if entry.is_dir() {
                fs::create_dir_all(&dest)?;
                continue;
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = fs::File::create(&dest)?;
            std::io::copy(&mut entry, &mut out)?;
        }

        let dist_info = dist_info.unwrap_or_else(|| {
            self.root
                .join(format!("{}-{}.dist-info", wheel.name.replace('-', "_"), version))
        });
        fs::create_dir_all(&dist_info)?;
        let record = InstallRecord {
            name: wheel.name.clone(),
            version,
            depends: wheel.depends.clone(),
            imports: wheel.imports.clone(),
            source: wheel.url.clone(),
        };
        fs::write(
            dist_info.join(RECORD_FILE),
            serde_json::to_string_pretty(&record)?,
        )?;
        tracing::info!(package = %wheel.name, version = %record.version, "installed");
        Ok(())
    }

    /// Register a package without any wheel behind it: stub modules plus
    /// an install record. Useful for satisfying dependencies that are
    /// provided by the embedding environment.
    pub fn add_mock_package(&self, name: &str, version: &str, imports: &[String]) -> Result<()> {
        let name = normalize_name(name);
        let imports = if imports.is_empty() {
            vec![name.replace('-', "_")]
        } else {
            imports.to_vec()
        };
        fs::create_dir_all(&self.root)?;
        for import in &imports {
            fs::write(self.root.join(format!("{import}.py")), "")?;
        }
        let dist_info = self
            .root
            .join(format!("{}-{}.dist-info", name.replace('-', "_"), version));
        fs::create_dir_all(&dist_info)?;
        let record = InstallRecord {
            name,
            version: version.to_string(),
            depends: Vec::new(),
            imports,
            source: "mock".to_string(),
        };
        fs::write(
            dist_info.join(RECORD_FILE),
            serde_json::to_string_pretty(&record)?,
        )?;
        Ok(())
    }
}

/// Resolve requirements against an index and install the result.
///
/// Already-installed packages are seeded into the transaction so they are
/// treated as pinned rather than re-downloaded.
pub fn install_requirements<S: AsRef<str>>(
    index: &dyn Index,
    platform: &Platform,
    site: &SiteDirectory,
    requirements: &[S],
    options: TransactionOptions,
) -> Result<Vec<WheelInfo>> {
    let mut transaction = Transaction::new(index, platform.clone(), options);
    for record in site.installed_records()? {
        if let Ok(version) = record.version.parse() {
            transaction.seed_locked(&record.name, version);
        }
    }
    transaction.gather(requirements)?;
    for wheel in &transaction.wheels {
        site.install(wheel)?;
    }
    Ok(transaction.wheels)
}
