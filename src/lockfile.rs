//! Environment snapshots
//!
//! `freeze` projects the install records of a target directory into a
//! JSON document: package name to version, dependency names and importable
//! modules. The snapshot is a pure function of what is installed; it never
//! touches the index.

use crate::installer::{InstallRecord, SiteDirectory};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedPackage {
    pub version: String,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub packages: BTreeMap<String, LockedPackage>,
}

impl Snapshot {
    pub fn from_records(records: &[InstallRecord]) -> Self {
        let packages = records
            .iter()
            .map(|r| {
                (
                    r.name.clone(),
                    LockedPackage {
                        version: r.version.clone(),
                        depends: r.depends.clone(),
                        imports: r.imports.clone(),
                    },
                )
            })
            .collect();
        Self { packages }
    }

    pub fn from_site(site: &SiteDirectory) -> Result<Self> {
        Ok(Self::from_records(&site.installed_records()?))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, version: &str, depends: &[&str], imports: &[&str]) -> InstallRecord {
        InstallRecord {
            name: name.to_string(),
            version: version.to_string(),
            depends: depends.iter().map(|s| s.to_string()).collect(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            source: "https://files.example/whatever.whl".to_string(),
        }
    }

    #[test]
    fn test_snapshot_shape() {
        let snapshot = Snapshot::from_records(&[
            record("attrs", "21.4.0", &[], &["attr", "attrs"]),
            record("pytest", "7.2.2", &["attrs", "pluggy"], &["pytest"]),
        ]);
        let json = snapshot.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["packages"]["pytest"]["version"], "7.2.2");
        assert_eq!(value["packages"]["pytest"]["depends"][0], "attrs");
        assert_eq!(value["packages"]["attrs"]["imports"][1], "attrs");

        let parsed = Snapshot::from_json(&json).unwrap();
        assert_eq!(parsed.packages.len(), 2);
        assert_eq!(parsed.packages["pytest"].depends, vec!["attrs", "pluggy"]);
    }
}
