//! CLI configuration
//!
//! Loaded from `~/.picopip/config.toml` (override the directory with
//! `PICOPIP_CONFIG_DIR`). Every field has a default, so a missing file is
//! the same as an empty one.

use crate::platform::Platform;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const CONFIG_DIR_ENV: &str = "PICOPIP_CONFIG_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub install: InstallConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_url")]
    pub url: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Directory packages are unpacked into.
    #[serde(default = "default_target")]
    pub target: PathBuf,
    /// Allow pre-release versions by default.
    #[serde(default)]
    pub pre: bool,
    /// Follow dependencies by default.
    #[serde(default = "default_true")]
    pub deps: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            pre: false,
            deps: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Interpreter tag, e.g. `cp311`.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// ABI tag; defaults to the interpreter tag.
    #[serde(default)]
    pub abi: Option<String>,
    /// Platform tag; defaults to the detected host platform.
    #[serde(default)]
    pub platform: Option<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            abi: None,
            platform: None,
        }
    }
}

fn default_index_url() -> String {
    crate::registry::HttpIndex::DEFAULT_BASE.to_string()
}

fn default_target() -> PathBuf {
    PathBuf::from("site-packages")
}

fn default_interpreter() -> String {
    "cp311".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn dir() -> PathBuf {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return PathBuf::from(dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".picopip")
    }

    pub fn path() -> PathBuf {
        Self::dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::path();
        if !path.is_file() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn save(&self) -> Result<()> {
        let dir = Self::dir();
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("config.toml"), toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The platform wheels are selected for, with config overrides
    /// applied on top of host detection.
    pub fn target_platform(&self) -> Result<Platform> {
        let detected = Platform::detect();
        let abi = self
            .platform
            .abi
            .clone()
            .unwrap_or_else(|| self.platform.interpreter.clone());
        let platform_tag = self
            .platform
            .platform
            .clone()
            .unwrap_or(detected.platform);
        Platform::new(&self.platform.interpreter, &abi, &platform_tag)
    }
}
