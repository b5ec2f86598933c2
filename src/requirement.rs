//! Requirement strings
//!
//! `name[extra1,extra2]>=1.0,<2.0; marker` is the unit of work the
//! transaction queues. The name is normalized on parse; the textual form
//! produced by `Display` deliberately drops the marker, because queued
//! dependency strings have already had their marker evaluated.

use crate::marker::Marker;
use crate::version::Specifiers;
use crate::wheel::normalize_name;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

static REQUIREMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[([^\]]*)\])?\s*(.*)$")
        .expect("requirement regex")
});

#[derive(Debug, Clone)]
pub struct Requirement {
    /// Normalized project name.
    pub name: String,
    pub extras: BTreeSet<String>,
    pub specifiers: Specifiers,
    pub marker: Option<Marker>,
}

impl Requirement {
    /// Whether a requirement string refers to a wheel directly rather
    /// than a project name to resolve against the index.
    pub fn is_direct_locator(s: &str) -> bool {
        if s.contains("://") {
            return true;
        }
        let path = s.split(['?', '#']).next().unwrap_or(s);
        path.ends_with(".whl")
    }
}

impl FromStr for Requirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (req, marker) = match s.split_once(';') {
            Some((req, marker)) => (req, Some(marker.trim().parse::<Marker>()?)),
            None => (s, None),
        };
        let caps = REQUIREMENT_RE
            .captures(req)
            .ok_or_else(|| Error::InvalidRequirement(s.to_string()))?;

        let name = normalize_name(&caps[1]);
        let extras = caps
            .get(2)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(|e| normalize_name(e.trim()))
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let spec = caps
            .get(3)
            .map(|m| m.as_str().trim())
            .unwrap_or("")
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim();
        let specifiers: Specifiers = spec
            .parse()
            .map_err(|_| Error::InvalidRequirement(s.to_string()))?;

        Ok(Self {
            name,
            extras,
            specifiers,
            marker,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        write!(f, "{}", self.specifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerContext;

    #[test]
    fn test_bare_name() {
        let r: Requirement = "pytest".parse().unwrap();
        assert_eq!(r.name, "pytest");
        assert!(r.extras.is_empty());
        assert!(r.specifiers.0.is_empty());
        assert!(r.marker.is_none());
    }

    #[test]
    fn test_name_is_normalized() {
        let r: Requirement = "Scikit_Learn".parse().unwrap();
        assert_eq!(r.name, "scikit-learn");
    }

    #[test]
    fn test_specifiers() {
        let r: Requirement = "pytest >=7.0, <8".parse().unwrap();
        assert_eq!(r.specifiers.0.len(), 2);
        assert!(r.specifiers.matches(&"7.2.2".parse().unwrap()));
        assert!(!r.specifiers.matches(&"8.0.0".parse().unwrap()));

        // parenthesized form
        let r: Requirement = "pytest (>=7.0)".parse().unwrap();
        assert!(r.specifiers.matches(&"7.0".parse().unwrap()));
    }

    #[test]
    fn test_extras() {
        let r: Requirement = "pytest-cov[Full, chrome]>=1.0".parse().unwrap();
        assert_eq!(r.name, "pytest-cov");
        assert_eq!(
            r.extras,
            ["full", "chrome"]
                .into_iter()
                .map(String::from)
                .collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn test_marker() {
        let r: Requirement = "zstandard; python_version < '3.7'".parse().unwrap();
        let marker = r.marker.unwrap();
        let mut ctx = MarkerContext::default();
        ctx.set("python_version", "3.11");
        assert!(!marker.evaluate(&ctx));
    }

    #[test]
    fn test_display_drops_marker() {
        let r: Requirement = "pkg[extra]>=1.0; extra == 'other'".parse().unwrap();
        assert_eq!(r.to_string(), "pkg[extra]>=1.0");
    }

    #[test]
    fn test_direct_locator() {
        assert!(Requirement::is_direct_locator(
            "https://a/snowballstemmer-2.0.0-py2.py3-none-any.whl"
        ));
        assert!(Requirement::is_direct_locator(
            "copied_wheel-1.0-py3-none-any.whl"
        ));
        assert!(Requirement::is_direct_locator(
            "copied_wheel-1.0-py3-none-any.whl?x=1"
        ));
        assert!(!Requirement::is_direct_locator("pytest>=7.0"));
    }

    #[test]
    fn test_invalid() {
        assert!("[extra]".parse::<Requirement>().is_err());
        assert!("pkg >< 1.0".parse::<Requirement>().is_err());
    }
}
