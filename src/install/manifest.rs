use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const ORIGIN_SCHEME: &str = "chrome-extension:";
const ORIGIN_PREFIX: &str = "chrome-extension://";

/// Reasons a manifest is rejected before anything touches the disk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    #[error(
        "host name {0:?} must be lowercase alphanumerics and underscores, separated by single dots"
    )]
    InvalidName(String),

    #[error("description is required")]
    MissingDescription,

    #[error("path is required")]
    MissingPath,

    #[error("at least one allowed origin is required")]
    NoAllowedOrigins,

    #[error("allowed origin {0:?} does not match 'chrome-extension://<ID>/'")]
    InvalidOrigin(String),
}

/// The only interface Chrome supports: stdin/stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    #[default]
    Stdio,
}

/// A native messaging host manifest, serialized as the JSON file Chrome reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Name the extension passes to `runtime.connectNative` / `runtime.sendNativeMessage`.
    pub name: String,
    pub description: String,
    /// Host binary. Must be absolute on Linux and macOS.
    pub path: PathBuf,
    #[serde(rename = "type", default)]
    host_type: HostType,
    allowed_origins: Vec<String>,
}

impl Manifest {
    /// Build a manifest. Bare extension IDs in `allowed_origins` become
    /// `chrome-extension://<ID>/`.
    pub fn new<I, S>(
        name: impl Into<String>,
        description: impl Into<String>,
        path: impl Into<PathBuf>,
        allowed_origins: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut manifest = Self {
            name: name.into(),
            description: description.into(),
            path: path.into(),
            host_type: HostType::Stdio,
            allowed_origins: Vec::new(),
        };
        manifest.set_allowed_origins(allowed_origins);
        manifest
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn set_allowed_origins<I, S>(&mut self, origins: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_origins = origins
            .into_iter()
            .map(|origin| normalize_origin(origin.as_ref()))
            .collect();
    }

    /// Check every field against what Chrome accepts.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if !is_valid_host_name(&self.name) {
            return Err(ManifestError::InvalidName(self.name.clone()));
        }
        if self.description.is_empty() {
            return Err(ManifestError::MissingDescription);
        }
        if self.path.as_os_str().is_empty() {
            return Err(ManifestError::MissingPath);
        }
        if self.allowed_origins.is_empty() {
            return Err(ManifestError::NoAllowedOrigins);
        }
        if let Some(bad) = self.allowed_origins.iter().find(|o| !is_valid_origin(o)) {
            return Err(ManifestError::InvalidOrigin(bad.clone()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Turn a bare extension ID into `chrome-extension://<ID>/`. Anything that
/// already uses the scheme, and the empty string, is left alone.
pub fn normalize_origin(origin: &str) -> String {
    if origin.is_empty() || origin.starts_with(ORIGIN_SCHEME) {
        origin.to_string()
    } else {
        format!("{ORIGIN_PREFIX}{origin}/")
    }
}

/// `^[a-z0-9_]+(\.[a-z0-9_]+)*$`
pub fn is_valid_host_name(name: &str) -> bool {
    name.split('.').all(|segment| {
        !segment.is_empty()
            && segment
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    })
}

/// `chrome-extension://<ID>/` with a non-empty ID and no wildcards.
pub fn is_valid_origin(origin: &str) -> bool {
    origin
        .strip_prefix(ORIGIN_PREFIX)
        .and_then(|rest| rest.strip_suffix('/'))
        .is_some_and(|id| !id.is_empty() && !id.contains('*'))
}
