//! Package index access
//!
//! The resolver only needs two things from an index: the release listing
//! for a project and the bytes behind a URL. Both sit behind the [`Index`]
//! trait so tests can substitute an in-memory index; [`HttpIndex`] is the
//! production implementation against a PyPI-shaped JSON API.

use crate::wheel::normalize_name;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Digests published by the index next to a release file.
#[derive(Debug, Clone, Deserialize)]
pub struct Digests {
    pub sha256: String,
}

/// One downloadable file of a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseFile {
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub digests: Option<Digests>,
}

/// All published releases of a project, keyed by version string.
///
/// Extra fields in the index response (project info, latest-release URLs)
/// are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseIndex {
    pub releases: BTreeMap<String, Vec<ReleaseFile>>,
}

/// Where release metadata and wheel bytes come from.
pub trait Index {
    /// The release listing for a project name.
    fn release_index(&self, name: &str) -> Result<ReleaseIndex>;

    /// Download the bytes behind a URL.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP client against a `{base}/{name}/json` style index.
pub struct HttpIndex {
    client: reqwest::blocking::Client,
    base: String,
}

impl HttpIndex {
    pub const DEFAULT_BASE: &'static str = "https://pypi.org/pypi";

    pub fn new(base: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("picopip/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }
}

impl Index for HttpIndex {
    fn release_index(&self, name: &str) -> Result<ReleaseIndex> {
        let url = format!("{}/{}/json", self.base, normalize_name(name));
        tracing::debug!(%url, "querying index");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| request_error(&url, e))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::PackageNotFound(name.to_string()));
        }
        let response = response.error_for_status()?;
        Ok(response.json()?)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(%url, "downloading");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| request_error(url, e))?;
        if !response.status().is_success() {
            return Err(Error::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP status {}", response.status()),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

fn request_error(url: &str, err: reqwest::Error) -> Error {
    let reason = if err.is_connect() {
        "could not connect to the host".to_string()
    } else if err.is_timeout() {
        "the request timed out".to_string()
    } else {
        err.to_string()
    };
    Error::FetchFailed {
        url: url.to_string(),
        reason,
    }
}

/// Compare downloaded bytes against an expected hex sha256 digest.
pub fn verify_sha256(data: &[u8], expected: &str, what: &str) -> Result<()> {
    use sha2::{Digest, Sha256};
    let actual = hex::encode(Sha256::digest(data));
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch(what.to_string()))
    }
}
