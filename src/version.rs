//! Version parsing, ordering and constraint evaluation
//!
//! Versions follow the `[N!]N(.N)*[{a|b|rc}N][.postN][.devN]` grammar used
//! by Python package indexes. Hyphenated spellings such as `1.2.3-1` are
//! rejected; the resolver skips release keys that do not parse instead of
//! guessing at their meaning.
//!
//! # Examples
//!
//! ```
//! use picopip::version::{Version, Specifiers};
//!
//! let a: Version = "1.0.0a1".parse().unwrap();
//! let b: Version = "1.0.0".parse().unwrap();
//! assert!(a < b);
//!
//! let spec: Specifiers = ">=1.0, <2.0".parse().unwrap();
//! assert!(spec.matches(&b));
//! ```

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^
          (?:(?P<epoch>\d+)!)?
          (?P<release>\d+(?:\.\d+)*)
          (?:\.?(?P<prekind>a|alpha|b|beta|rc|c|pre|preview)(?P<pre>\d+)?)?
          (?:\.(?P<postsec>post|rev|r)(?P<post>\d+)?)?
          (?:\.(?P<devsec>dev)(?P<dev>\d+)?)?
          $",
    )
    .expect("version regex")
});

/// Pre-release phase, ordered `a < b < rc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

impl fmt::Display for PreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreKind::Alpha => write!(f, "a"),
            PreKind::Beta => write!(f, "b"),
            PreKind::Rc => write!(f, "rc"),
        }
    }
}

/// A parsed package version.
///
/// Ordering follows the standard release / pre / post / dev rules:
/// release segments compare component-wise with zero padding, a dev
/// release orders before any pre-release at the same release number,
/// pre-releases order before the final release, post-releases after it.
#[derive(Debug, Clone)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreKind, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
}

impl Version {
    /// True when the version carries a pre-release or dev segment.
    ///
    /// Such versions are skipped by the resolver unless the transaction
    /// enables pre-releases or a specifier explicitly pins one.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Compare release segments with implicit zero padding, so that
    /// `1.0` and `1.0.0` are equal.
    fn cmp_release(a: &[u64], b: &[u64]) -> Ordering {
        let len = a.len().max(b.len());
        for i in 0..len {
            let (x, y) = (a.get(i).unwrap_or(&0), b.get(i).unwrap_or(&0));
            match x.cmp(y) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    // Phase key at the same release number: dev-only < pre < final.
    fn phase_key(&self) -> (u8, u8, u64) {
        match (&self.pre, self.post, self.dev) {
            (Some((kind, n)), _, _) => (1, *kind as u8, *n),
            (None, None, Some(_)) => (0, 0, 0),
            _ => (2, 0, 0),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| Self::cmp_release(&self.release, &other.release))
            .then_with(|| self.phase_key().cmp(&other.phase_key()))
            .then_with(|| {
                let post = |v: &Self| (v.post.is_some() as u8, v.post.unwrap_or(0));
                post(self).cmp(&post(other))
            })
            .then_with(|| {
                // No dev segment sorts after any dev segment.
                let dev = |v: &Self| match v.dev {
                    Some(n) => (0u8, n),
                    None => (1, 0),
                };
                dev(self).cmp(&dev(other))
            })
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let caps = VERSION_RE
            .captures(s)
            .ok_or_else(|| Error::InvalidVersion(s.to_string()))?;

        let epoch = caps
            .name("epoch")
            .map(|m| m.as_str().parse())
            .transpose()
            .map_err(|_| Error::InvalidVersion(s.to_string()))?
            .unwrap_or(0);

        let release = caps["release"]
            .split('.')
            .map(|part| part.parse())
            .collect::<std::result::Result<Vec<u64>, _>>()
            .map_err(|_| Error::InvalidVersion(s.to_string()))?;

        let pre = caps.name("prekind").map(|kind| {
            let kind = match kind.as_str().to_ascii_lowercase().as_str() {
                "a" | "alpha" => PreKind::Alpha,
                "b" | "beta" => PreKind::Beta,
                _ => PreKind::Rc,
            };
            let n = caps
                .name("pre")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            (kind, n)
        });

        // `.post` with no number is post release zero; same for `.dev`
        let post = caps.name("postsec").map(|_| {
            caps.name("post")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        });

        let dev = caps.name("devsec").map(|_| {
            caps.name("dev")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        });

        Ok(Version {
            epoch,
            release,
            pre,
            post,
            dev,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((kind, n)) = &self.pre {
            write!(f, "{}{}", kind, n)?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{}", n)?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{}", n)?;
        }
        Ok(())
    }
}

/// Comparison operator of a single specifier clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Compatible,
}

/// One `<op><version>` clause, e.g. `>=1.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub op: Op,
    pub version: Version,
}

impl Specifier {
    pub fn matches(&self, v: &Version) -> bool {
        match self.op {
            Op::Eq => v.cmp(&self.version) == Ordering::Equal,
            Op::Ne => v.cmp(&self.version) != Ordering::Equal,
            Op::Lt => v < &self.version,
            Op::Le => v <= &self.version,
            Op::Gt => v > &self.version,
            Op::Ge => v >= &self.version,
            Op::Compatible => {
                // ~= X.Y.Z means >= X.Y.Z with the X.Y release prefix fixed
                if v < &self.version || v.epoch != self.version.epoch {
                    return false;
                }
                let prefix = &self.version.release[..self.version.release.len() - 1];
                v.release
                    .iter()
                    .chain(std::iter::repeat(&0))
                    .take(prefix.len())
                    .eq(prefix.iter())
            }
        }
    }
}

impl FromStr for Specifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (op, rest) = if let Some(rest) = s.strip_prefix("==") {
            (Op::Eq, rest)
        } else if let Some(rest) = s.strip_prefix("!=") {
            (Op::Ne, rest)
        } else if let Some(rest) = s.strip_prefix("<=") {
            (Op::Le, rest)
        } else if let Some(rest) = s.strip_prefix(">=") {
            (Op::Ge, rest)
        } else if let Some(rest) = s.strip_prefix("~=") {
            (Op::Compatible, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (Op::Lt, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (Op::Gt, rest)
        } else {
            return Err(Error::InvalidRequirement(s.to_string()));
        };
        let version: Version = rest.trim().parse()?;
        if op == Op::Compatible && version.release.len() < 2 {
            return Err(Error::InvalidRequirement(format!(
                "'~= {}' needs at least a major.minor release",
                version
            )));
        }
        Ok(Specifier { op, version })
    }
}

/// A conjunctive list of specifier clauses, e.g. `>=1.0, <2.0, !=1.5`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specifiers(pub Vec<Specifier>);

impl Specifiers {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All clauses must hold.
    pub fn matches(&self, v: &Version) -> bool {
        self.0.iter().all(|s| s.matches(v))
    }

    /// True when any clause itself names a pre-release version, which
    /// makes pre-releases eligible for that requirement even without the
    /// transaction-wide flag.
    pub fn mentions_prerelease(&self) -> bool {
        self.0.iter().any(|s| s.version.is_prerelease())
    }
}

impl FromStr for Specifiers {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Specifiers::default());
        }
        let clauses = s
            .split(',')
            .map(|clause| clause.parse())
            .collect::<Result<Vec<Specifier>>>()?;
        Ok(Specifiers(clauses))
    }
}

impl fmt::Display for Specifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|s| {
                let op = match s.op {
                    Op::Eq => "==",
                    Op::Ne => "!=",
                    Op::Lt => "<",
                    Op::Le => "<=",
                    Op::Gt => ">",
                    Op::Ge => ">=",
                    Op::Compatible => "~=",
                };
                format!("{}{}", op, s.version)
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
