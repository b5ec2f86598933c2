//! Wheel artifact references
//!
//! A [`WheelInfo`] starts life as a parsed filename (name, version,
//! compatibility tags) plus the URL it can be fetched from. The transaction
//! later attaches the downloaded bytes and the metadata read out of the
//! archive, so by install time a single value carries everything the
//! target directory needs.

use crate::platform::Tag;
use crate::version::Version;
use crate::{Error, Result};

/// Canonical package name: lowercased, with runs of `-`, `_` and `.`
/// collapsed to a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_sep = false;
    for c in name.chars() {
        if c == '-' || c == '_' || c == '.' {
            if !prev_sep {
                out.push('-');
            }
            prev_sep = true;
        } else {
            out.push(c.to_ascii_lowercase());
            prev_sep = false;
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct WheelInfo {
    /// Normalized project name.
    pub name: String,
    pub version: Version,
    pub filename: String,
    pub url: String,
    /// Expected digest, when the index publishes one.
    pub sha256: Option<String>,
    pub tags: Vec<Tag>,
    /// Raw `Requires-Dist` strings from the wheel metadata.
    pub requires_dist: Vec<String>,
    /// Top-level importable modules, when the wheel declares them.
    pub imports: Vec<String>,
    /// Normalized names of the dependencies the transaction followed.
    pub depends: Vec<String>,
    /// Archive bytes, attached after fetching.
    pub data: Vec<u8>,
}

impl WheelInfo {
    /// Parse a wheel reference from a URL or bare filename.
    ///
    /// Query strings and fragments are stripped before the filename is
    /// taken from the last path segment.
    pub fn from_url(url: &str) -> Result<Self> {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url);
        let filename = path.rsplit('/').next().unwrap_or(path);
        Self::from_filename(filename, url, None)
    }

    /// Parse a wheel reference from an index-provided filename, keeping
    /// the download URL and digest the index published alongside it.
    pub fn from_file(filename: &str, url: &str, sha256: Option<String>) -> Result<Self> {
        Self::from_filename(filename, url, sha256)
    }

    fn from_filename(filename: &str, url: &str, sha256: Option<String>) -> Result<Self> {
        let stem = filename
            .strip_suffix(".whl")
            .ok_or_else(|| Error::MalformedWheelName(filename.to_string()))?;
        let parts: Vec<&str> = stem.split('-').collect();
        // name-version[-build]-interpreter-abi-platform
        let (name, version, tag_parts) = match parts.len() {
            5 => (parts[0], parts[1], &parts[2..5]),
            6 => (parts[0], parts[1], &parts[3..6]),
            _ => return Err(Error::MalformedWheelName(filename.to_string())),
        };
        let version: Version = version
            .parse()
            .map_err(|_| Error::InvalidVersion(version.to_string()))?;

        // each component may be compressed, e.g. py2.py3-none-any
        let mut tags = Vec::new();
        for interpreter in tag_parts[0].split('.') {
            for abi in tag_parts[1].split('.') {
                for platform in tag_parts[2].split('.') {
                    tags.push(Tag::new(interpreter, abi, platform));
                }
            }
        }

        Ok(Self {
            name: normalize_name(name),
            version,
            filename: filename.to_string(),
            url: url.to_string(),
            sha256,
            tags,
            requires_dist: Vec::new(),
            imports: Vec::new(),
            depends: Vec::new(),
            data: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("snowballstemmer"), "snowballstemmer");
        assert_eq!(normalize_name("scikit_learn"), "scikit-learn");
        assert_eq!(normalize_name("ruamel.yaml"), "ruamel-yaml");
        assert_eq!(normalize_name("Pillow"), "pillow");
        assert_eq!(normalize_name("a__b--c..d"), "a-b-c-d");
    }

    #[test]
    fn test_from_url() {
        for url in [
            "http://a/snowballstemmer-2.0.0-py2.py3-none-any.whl",
            "https://a/snowballstemmer-2.0.0-py2.py3-none-any.whl",
            "https://a/b/c/snowballstemmer-2.0.0-py2.py3-none-any.whl",
            "snowballstemmer-2.0.0-py2.py3-none-any.whl",
        ] {
            let wheel = WheelInfo::from_url(url).unwrap();
            assert_eq!(wheel.name, "snowballstemmer");
            assert_eq!(wheel.version.to_string(), "2.0.0");
            assert_eq!(wheel.url, url);
            assert_eq!(
                wheel.tags,
                vec![
                    Tag::new("py2", "none", "any"),
                    Tag::new("py3", "none", "any"),
                ]
            );
        }
    }

    #[test]
    fn test_query_and_fragment_stripped() {
        let wheel = WheelInfo::from_url(
            "https://a/snowballstemmer-2.0.0-py2.py3-none-any.whl?download=true#sha=x",
        )
        .unwrap();
        assert_eq!(wheel.filename, "snowballstemmer-2.0.0-py2.py3-none-any.whl");
        assert_eq!(wheel.name, "snowballstemmer");
    }

    #[test]
    fn test_binary_wheel_filename() {
        let wheel = WheelInfo::from_url(
            "https://a/scikit_learn-0.22.2.post1-cp35-cp35m-macosx_10_9_intel.whl",
        )
        .unwrap();
        assert_eq!(wheel.name, "scikit-learn");
        assert_eq!(wheel.version.to_string(), "0.22.2.post1");
        assert_eq!(
            wheel.tags,
            vec![Tag::new("cp35", "cp35m", "macosx_10_9_intel")]
        );
    }

    #[test]
    fn test_build_tag_ignored() {
        let wheel = WheelInfo::from_url("pkg-1.0-1-py3-none-any.whl").unwrap();
        assert_eq!(wheel.name, "pkg");
        assert_eq!(wheel.version.to_string(), "1.0");
        assert_eq!(wheel.tags, vec![Tag::new("py3", "none", "any")]);
    }

    #[test]
    fn test_malformed_filenames() {
        let err = WheelInfo::from_url("snowballstemmer-2.0.0-py2.whl").unwrap_err();
        assert!(err
            .to_string()
            .contains("Invalid wheel filename 'snowballstemmer-2.0.0-py2.whl' (wrong number of parts)"));
        assert!(WheelInfo::from_url("not-a-wheel.tar.gz").is_err());
        assert!(WheelInfo::from_url("a-b-c-d-e-f-g.whl").is_err());
    }

    #[test]
    fn test_from_file_keeps_digest() {
        let wheel = WheelInfo::from_file(
            "pytest-7.2.2-py3-none-any.whl",
            "https://files.example/pytest-7.2.2-py3-none-any.whl",
            Some("deadbeef".to_string()),
        )
        .unwrap();
        assert_eq!(wheel.sha256.as_deref(), Some("deadbeef"));
        assert_eq!(wheel.name, "pytest");
    }
}
