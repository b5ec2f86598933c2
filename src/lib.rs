//! picopip resolves Python wheel requirements against a PyPI-shaped index
//! and installs them into a target directory.
//!
//! Modules:
//! - `version`: version grammar, ordering and specifiers
//! - `marker`: environment marker expressions
//! - `requirement`: requirement strings (name, extras, specifiers, marker)
//! - `platform`: target description and wheel tag matching
//! - `wheel`: wheel filename/URL parsing and artifact state
//! - `registry`: the index seam and the HTTP implementation
//! - `metadata`: reading METADATA out of wheel archives
//! - `resolver`: picking the wheel for one requirement
//! - `transaction`: queue-driven resolution of requirement sets
//! - `installer`: unpacking wheels into a site directory
//! - `lockfile`: freeze snapshots
//! - `config`: CLI configuration

pub mod config;
pub mod error;
pub mod installer;
pub mod lockfile;
pub mod marker;
pub mod metadata;
pub mod platform;
pub mod registry;
pub mod requirement;
pub mod resolver;
pub mod transaction;
pub mod version;
pub mod wheel;

pub use config::Config;
pub use error::{Error, Result};
pub use installer::{install_requirements, InstallRecord, SiteDirectory};
pub use lockfile::Snapshot;
pub use platform::{Platform, Tag};
pub use registry::{HttpIndex, Index, ReleaseIndex};
pub use requirement::Requirement;
pub use transaction::{Transaction, TransactionOptions};
pub use version::{Specifiers, Version};
pub use wheel::WheelInfo;
