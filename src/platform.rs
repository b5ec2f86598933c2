//! Target platform description and wheel tag matching
//!
//! A wheel filename carries one or more `interpreter-abi-platform` tags.
//! The [`Platform`] knows the ordered list of tags the target accepts,
//! from the least specific (`py30-none-any`) to the most specific
//! (`cp311-cp311-<platform>`). A wheel is compatible when any of its tags
//! appears in that list, and the best wheel for a release is the one whose
//! tag sits furthest along it.

use crate::marker::MarkerContext;
use crate::wheel::WheelInfo;
use crate::{Error, Result};
use std::fmt;

/// One `interpreter-abi-platform` compatibility tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub interpreter: String,
    pub abi: String,
    pub platform: String,
}

impl Tag {
    pub fn new(interpreter: &str, abi: &str, platform: &str) -> Self {
        Self {
            interpreter: interpreter.to_string(),
            abi: abi.to_string(),
            platform: platform.to_string(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
    }
}

/// The environment wheels are selected for.
///
/// `platform` is a full platform tag such as `emscripten_3_1_14_wasm32` or
/// `manylinux_2_17_x86_64`. For platforms that embed a runtime build
/// version in the tag, a mismatched build is reported separately from a
/// wholly different platform.
#[derive(Debug, Clone)]
pub struct Platform {
    pub interpreter: String,
    pub abi: String,
    pub platform: String,
    /// Python (major, minor) derived from the interpreter tag.
    pub python: (u64, u64),
}

impl Platform {
    /// Build a platform from explicit tag components.
    ///
    /// The interpreter tag must be of the form `cp311` / `py312`: a two
    /// letter implementation code followed by the major digit and the
    /// minor digits.
    pub fn new(interpreter: &str, abi: &str, platform: &str) -> Result<Self> {
        let digits = interpreter.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        let python = if digits.len() >= 2 && digits.chars().all(|c| c.is_ascii_digit()) {
            let major = digits[..1]
                .parse()
                .map_err(|_| Error::Other(format!("invalid interpreter tag '{interpreter}'")))?;
            let minor = digits[1..]
                .parse()
                .map_err(|_| Error::Other(format!("invalid interpreter tag '{interpreter}'")))?;
            (major, minor)
        } else {
            return Err(Error::Other(format!(
                "invalid interpreter tag '{interpreter}'"
            )));
        };
        Ok(Self {
            interpreter: interpreter.to_string(),
            abi: abi.to_string(),
            platform: platform.to_string(),
            python,
        })
    }

    /// The host platform with a CPython 3.11 interpreter.
    pub fn detect() -> Self {
        let platform = if cfg!(target_os = "linux") {
            if cfg!(target_arch = "aarch64") {
                "manylinux_2_17_aarch64"
            } else {
                "manylinux_2_17_x86_64"
            }
        } else if cfg!(target_os = "macos") {
            if cfg!(target_arch = "aarch64") {
                "macosx_11_0_arm64"
            } else {
                "macosx_10_9_x86_64"
            }
        } else if cfg!(target_os = "windows") {
            "win_amd64"
        } else {
            "any"
        };
        Self {
            interpreter: "cp311".to_string(),
            abi: "cp311".to_string(),
            platform: platform.to_string(),
            python: (3, 11),
        }
    }

    /// Default marker variables for this target.
    pub fn marker_context(&self) -> MarkerContext {
        let (major, minor) = self.python;
        let sys_platform = if self.platform.starts_with("emscripten") {
            "emscripten"
        } else if self.platform.starts_with("win") {
            "win32"
        } else if self.platform.starts_with("macosx") {
            "darwin"
        } else {
            "linux"
        };
        let mut ctx = MarkerContext::default();
        ctx.set("python_version", &format!("{major}.{minor}"));
        ctx.set("python_full_version", &format!("{major}.{minor}.0"));
        ctx.set("implementation_name", "cpython");
        ctx.set("platform_python_implementation", "CPython");
        ctx.set("sys_platform", sys_platform);
        ctx.set("os_name", if sys_platform == "win32" { "nt" } else { "posix" });
        ctx
    }

    /// All tags this platform accepts, in ascending order of specificity.
    ///
    /// Layout, least specific first:
    /// generic-interpreter tags on `any`, the exact interpreter on `any`,
    /// the same two groups on the real platform tag, the `abi3` ladder for
    /// older CPython minors, and finally the exact
    /// interpreter-abi-platform triple.
    pub fn supported_tags(&self) -> Vec<Tag> {
        let (major, minor) = self.python;
        let mut ladder: Vec<String> = (0..minor).map(|m| format!("py{major}{m}")).collect();
        ladder.push(format!("py{major}"));
        ladder.push(format!("py{major}{minor}"));

        let mut tags = Vec::new();
        for platform in [String::from("any"), self.platform.clone()] {
            for interp in &ladder {
                tags.push(Tag::new(interp, "none", &platform));
            }
            tags.push(Tag::new(&self.interpreter, "none", &platform));
        }
        for m in 2..=minor {
            tags.push(Tag::new(&format!("cp{major}{m}"), "abi3", &self.platform));
        }
        tags.push(Tag::new(&self.interpreter, &self.abi, &self.platform));
        tags
    }

    /// Index of the most specific supported tag the wheel carries, or
    /// `None` if no tag matches. Higher is better.
    pub fn best_compatible_tag_index(&self, tags: &[Tag]) -> Option<usize> {
        let supported = self.supported_tags();
        tags.iter()
            .filter_map(|tag| supported.iter().position(|s| s == tag))
            .max()
    }

    /// Check a wheel against this platform, reporting why it does not fit.
    ///
    /// The diagnosis looks at the wheel's binary tag and reports the first
    /// failing axis: foreign platform, same platform family built against a
    /// different runtime version, unsupported ABI, or unsupported
    /// interpreter.
    pub fn check_compatible(&self, wheel: &WheelInfo) -> Result<()> {
        if self.best_compatible_tag_index(&wheel.tags).is_some() {
            return Ok(());
        }
        let tag = wheel
            .tags
            .iter()
            .find(|t| t.platform != "any")
            .or_else(|| wheel.tags.first())
            .ok_or_else(|| Error::MalformedWheelName(wheel.filename.clone()))?;

        if tag.platform != "any" && tag.platform != self.platform {
            let (wheel_family, wheel_build) = platform_parts(&tag.platform);
            let (target_family, target_build) = platform_parts(&self.platform);
            if wheel_family == target_family
                && !wheel_build.is_empty()
                && wheel_build != target_build
            {
                return Err(Error::IncompatibleRuntimeBuild {
                    family: target_family,
                    wheel_build,
                    target_build,
                });
            }
            return Err(Error::IncompatiblePlatform {
                wheel: tag.platform.clone(),
                target: self.platform.clone(),
            });
        }
        if tag.abi != "none" && tag.abi != "abi3" && tag.abi != self.abi {
            return Err(Error::IncompatibleAbi {
                abi: tag.abi.clone(),
                target_abi: self.abi.clone(),
            });
        }
        Err(Error::IncompatibleInterpreter(tag.interpreter.clone()))
    }
}

/// Split a platform tag into its family and embedded build version,
/// e.g. `emscripten_3_1_14_wasm32` -> (`emscripten`, `3.1.14`).
fn platform_parts(platform: &str) -> (String, String) {
    let mut segments = platform.split('_');
    let family = segments.next().unwrap_or("").to_string();
    let build: Vec<&str> = segments
        .take_while(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .collect();
    (family, build.join("."))
}
