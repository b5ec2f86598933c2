//! Wheel metadata extraction
//!
//! Reads the `*.dist-info/METADATA` headers and the optional
//! `top_level.txt` out of a wheel archive. Only the fields resolution
//! needs are kept: name, version, `Requires-Dist` and `Provides-Extra`.

use crate::wheel::normalize_name;
use crate::{Error, Result};
use std::io::{Cursor, Read};

#[derive(Debug, Clone, Default)]
pub struct DistMetadata {
    /// Normalized project name as declared inside the wheel.
    pub name: String,
    pub version: String,
    /// Raw dependency strings, markers included.
    pub requires_dist: Vec<String>,
    /// Extra names the project declares.
    pub extras: Vec<String>,
    /// Top-level importable modules. Falls back to the project name with
    /// `-` replaced by `_` when the wheel ships no `top_level.txt`.
    pub imports: Vec<String>,
}

/// Read metadata out of wheel archive bytes.
pub fn extract(data: &[u8]) -> Result<DistMetadata> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    let metadata_path = names
        .iter()
        .find(|n| is_dist_info_file(n, "METADATA"))
        .ok_or_else(|| Error::InvalidMetadata("no METADATA file in wheel".to_string()))?
        .clone();

    let mut text = String::new();
    archive.by_name(&metadata_path)?.read_to_string(&mut text)?;
    let mut meta = parse_headers(&text);

    if let Some(top_level) = names.iter().find(|n| is_dist_info_file(n, "top_level.txt")) {
        let mut text = String::new();
        archive.by_name(top_level)?.read_to_string(&mut text)?;
        meta.imports = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
    }
    if meta.imports.is_empty() && !meta.name.is_empty() {
        meta.imports = vec![meta.name.replace('-', "_")];
    }
    if meta.name.is_empty() || meta.version.is_empty() {
        return Err(Error::InvalidMetadata(
            "METADATA is missing Name or Version".to_string(),
        ));
    }
    Ok(meta)
}

fn is_dist_info_file(path: &str, file: &str) -> bool {
    let mut parts = path.split('/');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(dir), Some(f), None) if dir.ends_with(".dist-info") && f == file
    )
}

/// Parse the RFC 822 style header block (everything before the first
/// blank line). Continuation lines are folded into the previous value.
fn parse_headers(text: &str) -> DistMetadata {
    let mut meta = DistMetadata::default();
    let mut last: Option<(&str, String)> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            break;
        }
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = last.as_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((key, prev)) = last.take() {
            store(&mut meta, key, prev);
        }
        if let Some((key, value)) = line.split_once(':') {
            last = Some((key.trim(), value.trim().to_string()));
        }
    }
    if let Some((key, value)) = last {
        store(&mut meta, key, value);
    }
    meta
}

fn store(meta: &mut DistMetadata, key: &str, value: String) {
    match key {
        "Name" => meta.name = normalize_name(&value),
        "Version" => meta.version = value,
        "Requires-Dist" => meta.requires_dist.push(value),
        "Provides-Extra" => meta.extras.push(normalize_name(&value)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn wheel_bytes(metadata: &str, top_level: Option<&str>) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            zip.start_file("pkg_a-1.0.dist-info/METADATA", FileOptions::default())
                .unwrap();
            zip.write_all(metadata.as_bytes()).unwrap();
            if let Some(top_level) = top_level {
                zip.start_file("pkg_a-1.0.dist-info/top_level.txt", FileOptions::default())
                    .unwrap();
                zip.write_all(top_level.as_bytes()).unwrap();
            }
            zip.start_file("pkg_a/__init__.py", FileOptions::default())
                .unwrap();
            zip.write_all(b"").unwrap();
            zip.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_extract_basic() {
        let data = wheel_bytes(
            "Metadata-Version: 2.1\n\
             Name: Pkg_A\n\
             Version: 1.0\n\
             Requires-Dist: dep-b>=2.0\n\
             Requires-Dist: dep-c; extra == 'full'\n\
             Provides-Extra: full\n\
             \n\
             Long description body, ignored.\n\
             Requires-Dist: not-a-header\n",
            None,
        );
        let meta = extract(&data).unwrap();
        assert_eq!(meta.name, "pkg-a");
        assert_eq!(meta.version, "1.0");
        assert_eq!(
            meta.requires_dist,
            vec!["dep-b>=2.0", "dep-c; extra == 'full'"]
        );
        assert_eq!(meta.extras, vec!["full"]);
        assert_eq!(meta.imports, vec!["pkg_a"]);
    }

    #[test]
    fn test_top_level_wins() {
        let data = wheel_bytes(
            "Name: pkg-a\nVersion: 1.0\n",
            Some("pkg_a\n_pkg_a_native\n"),
        );
        let meta = extract(&data).unwrap();
        assert_eq!(meta.imports, vec!["pkg_a", "_pkg_a_native"]);
    }

    #[test]
    fn test_continuation_lines() {
        let data = wheel_bytes(
            "Name: pkg-a\nVersion: 1.0\nRequires-Dist: dep-b\n (>=2.0)\n",
            None,
        );
        let meta = extract(&data).unwrap();
        assert_eq!(meta.requires_dist, vec!["dep-b (>=2.0)"]);
    }

    #[test]
    fn test_missing_metadata() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            zip.start_file("pkg_a/__init__.py", FileOptions::default())
                .unwrap();
            zip.write_all(b"").unwrap();
            zip.finish().unwrap();
        }
        let err = extract(&cursor.into_inner()).unwrap_err();
        assert!(matches!(err, Error::InvalidMetadata(_)));
    }
}
