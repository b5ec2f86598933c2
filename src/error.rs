use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Package not found: {0}\n\n\
             Hint: The index has no package under that name.\n\
             Check the spelling, or pass --index-url if the package lives\n\
             on a different index.")]
    PackageNotFound(String),

    #[error("No compatible wheel found for '{0}'\n\n\
             Hint: Releases exist, but none of them has a wheel that passes\n\
             both the version constraint and the platform tag check.\n\
             Try --pre if only pre-releases are published, or check that the\n\
             target platform supports a binary build of this package.")]
    NoCompatibleWheel(String),

    #[error("Wheel platform '{wheel}' is not compatible with the target platform '{target}'")]
    IncompatiblePlatform { wheel: String, target: String },

    #[error("Wheel was built for {family} v{wheel_build} but the target runtime is {family} v{target_build}")]
    IncompatibleRuntimeBuild {
        family: String,
        wheel_build: String,
        target_build: String,
    },

    #[error("Wheel ABI '{abi}' is not supported. Supported ABIs are 'none', 'abi3' and '{target_abi}'.")]
    IncompatibleAbi { abi: String, target_abi: String },

    #[error("Wheel interpreter version '{0}' is not supported.")]
    IncompatibleInterpreter(String),

    #[error("Invalid wheel filename '{0}' (wrong number of parts)")]
    MalformedWheelName(String),

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Invalid requirement '{0}'")]
    InvalidRequirement(String),

    #[error("Invalid marker expression '{0}'")]
    InvalidMarker(String),

    #[error("Invalid wheel metadata: {0}")]
    InvalidMetadata(String),

    #[error("Checksum mismatch for '{0}'\n\n\
             Hint: The downloaded wheel does not match the digest published\n\
             by the index. Retry the install; if it persists the index entry\n\
             may be corrupted.")]
    ChecksumMismatch(String),

    #[error("Failed to fetch '{url}': {reason}\n\n\
             Hint: The index entry was found but the wheel itself could not\n\
             be downloaded. Check connectivity to the file host; when running\n\
             behind a browser-style sandbox the host must also permit\n\
             cross-origin requests (Access-Control-Allow-Origin).")]
    FetchFailed { url: String, reason: String },

    #[error("Dependency conflict: {0}")]
    DependencyConflict(String),

    #[error("Can't install the following requirements: {}", .0.join("; "))]
    AggregateFailure(Vec<String>),

    #[error("{0}")]
    Other(String),
}
