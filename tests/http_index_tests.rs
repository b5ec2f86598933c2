//! HTTP index behavior against a local mock server.


use picopip::registry::{HttpIndex, Index};
use picopip::{install_requirements, Error, SiteDirectory, TransactionOptions};
use sha2::{Digest, Sha256};
use test_utils::{build_wheel, test_platform, wheel_filename};

#[test]
fn test_missing_package_is_not_found() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/missing/json")
        .with_status(404)
        .create();

    let index = HttpIndex::new(&server.url()).unwrap();
    let err = index.release_index("missing").unwrap_err();
    assert!(matches!(err, Error::PackageNotFound(_)));
}

#[test]
fn test_name_is_normalized_in_the_query() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/scikit-learn/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"releases": {}}"#)
        .create();

    let index = HttpIndex::new(&server.url()).unwrap();
    let release_index = index.release_index("Scikit_Learn").unwrap();
    assert!(release_index.releases.is_empty());
    mock.assert();
}

#[test]
fn test_fetch_http_error() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/files/gone.whl")
        .with_status(500)
        .create();

    let index = HttpIndex::new(&server.url()).unwrap();
    let url = format!("{}/files/gone.whl", server.url());
    let err = index.fetch(&url).unwrap_err();
    assert!(matches!(err, Error::FetchFailed { .. }));
    assert!(err.to_string().contains("500"));
}

#[test]
fn test_full_install_flow() {
    let mut server = mockito::Server::new();

    let filename = wheel_filename("dummy", "1.0.0", "py3-none-any");
    let bytes = build_wheel("dummy", "1.0.0", &[]);
    let sha256 = hex::encode(Sha256::digest(&bytes));
    let wheel_url = format!("{}/files/{filename}", server.url());

    let body = format!(
        r#"{{
            "info": {{"name": "dummy"}},
            "releases": {{
                "1.0.0": [
                    {{
                        "filename": "{filename}",
                        "url": "{wheel_url}",
                        "digests": {{"sha256": "{sha256}"}}
                    }}
                ]
            }}
        }}"#
    );
    let index_mock = server
        .mock("GET", "/dummy/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create();
    let wheel_mock = server
        .mock("GET", format!("/files/{filename}").as_str())
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_body(bytes)
        .create();

    let index = HttpIndex::new(&server.url()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let site = SiteDirectory::new(dir.path());
    let wheels = install_requirements(
        &index,
        &test_platform(),
        &site,
        &["dummy"],
        TransactionOptions::default(),
    )
    .unwrap();

    assert_eq!(wheels.len(), 1);
    assert!(dir.path().join("dummy.py").is_file());
    assert_eq!(
        site.installed_version("dummy").unwrap().as_deref(),
        Some("1.0.0")
    );
    index_mock.assert();
    wheel_mock.assert();
}

#[test]
fn test_corrupted_download_is_rejected() {
    let mut server = mockito::Server::new();

    let filename = wheel_filename("dummy", "1.0.0", "py3-none-any");
    let bytes = build_wheel("dummy", "1.0.0", &[]);
    let sha256 = hex::encode(Sha256::digest(&bytes));
    let wheel_url = format!("{}/files/{filename}", server.url());

    let body = format!(
        r#"{{"releases": {{"1.0.0": [{{"filename": "{filename}", "url": "{wheel_url}", "digests": {{"sha256": "{sha256}"}}}}]}}}}"#
    );
    let _index_mock = server
        .mock("GET", "/dummy/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create();
    // serve different bytes than the digest promises
    let _wheel_mock = server
        .mock("GET", format!("/files/{filename}").as_str())
        .with_status(200)
        .with_body(b"tampered".to_vec())
        .create();

    let index = HttpIndex::new(&server.url()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let site = SiteDirectory::new(dir.path());
    let err = install_requirements(
        &index,
        &test_platform(),
        &site,
        &["dummy"],
        TransactionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch(_)));
}
