//! Wheel selection
//!
//! Given a project's release listing, pick the wheel to install: the
//! newest version that satisfies the requirement and ships at least one
//! wheel compatible with the target platform. Within that version the
//! wheel with the most specific matching tag wins. An older version with
//! a better tag never beats a newer version with any compatible tag.

use crate::platform::Platform;
use crate::registry::ReleaseIndex;
use crate::requirement::Requirement;
use crate::version::Version;
use crate::wheel::WheelInfo;
use crate::{Error, Result};

/// Select the wheel to install for a requirement, or fail with
/// [`Error::NoCompatibleWheel`] when releases exist but none fits.
///
/// Pre-release versions are skipped unless `allow_pre` is set or the
/// requirement itself pins a pre-release.
pub fn find_wheel(
    index: &ReleaseIndex,
    requirement: &Requirement,
    platform: &Platform,
    allow_pre: bool,
) -> Result<WheelInfo> {
    let allow_pre = allow_pre || requirement.specifiers.mentions_prerelease();

    let mut versions: Vec<(Version, &str)> = Vec::new();
    for key in index.releases.keys() {
        match key.parse::<Version>() {
            Ok(version) => versions.push((version, key)),
            Err(_) => {
                tracing::debug!(package = %requirement.name, release = %key, "skipping unparseable version");
            }
        }
    }
    versions.sort_by(|a, b| b.0.cmp(&a.0));

    for (version, key) in versions {
        if !requirement.specifiers.matches(&version) {
            continue;
        }
        if version.is_prerelease() && !allow_pre {
            continue;
        }

        let mut best: Option<(usize, WheelInfo)> = None;
        for file in &index.releases[key] {
            if !file.filename.ends_with(".whl") {
                continue;
            }
            let wheel = match WheelInfo::from_file(
                &file.filename,
                &file.url,
                file.digests.as_ref().map(|d| d.sha256.clone()),
            ) {
                Ok(wheel) => wheel,
                Err(err) => {
                    tracing::debug!(file = %file.filename, %err, "skipping file");
                    continue;
                }
            };
            if let Some(rank) = platform.best_compatible_tag_index(&wheel.tags) {
                if best.as_ref().map_or(true, |(r, _)| rank > *r) {
                    best = Some((rank, wheel));
                }
            }
        }
        if let Some((_, wheel)) = best {
            tracing::debug!(package = %wheel.name, version = %wheel.version, file = %wheel.filename, "selected wheel");
            return Ok(wheel);
        }
    }
    Err(Error::NoCompatibleWheel(requirement.to_string()))
}
