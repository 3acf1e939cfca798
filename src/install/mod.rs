//! Host manifest installation for Chromium-family browsers (user scope).
//!
//! [`install`] writes `<name>.json` into the `NativeMessagingHosts` directory of
//! every configured browser whose profile directory exists and, on Windows,
//! registers it under `HKCU`. [`uninstall`] reverses both.

pub mod manifest;
pub mod paths;

#[cfg(all(windows, feature = "windows-registry"))]
pub mod winreg;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

pub use manifest::{HostType, Manifest, ManifestError};
pub use paths::{browser, browsers, Browser};

/// Errors from installing, removing, or locating manifests.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("invalid manifest: {0}")]
    Invalid(#[from] ManifestError),

    #[error("host path {0:?} must be absolute on this platform")]
    RelativePath(PathBuf),

    #[error("unknown browser {0:?}")]
    UnknownBrowser(String),

    #[error("browser {0:?} has no install locations for this platform")]
    UnsupportedPlatform(String),

    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("{0:?} needs a Windows registry entry; rebuild with feature `windows-registry`")]
    RegistryUnsupported(String),

    #[error("browser configuration error: {0}")]
    Config(String),

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("install I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Browsers whose user data directory exists on this machine.
pub fn installed_browsers() -> Result<Vec<&'static Browser>, InstallError> {
    Ok(browsers()?.iter().filter(|b| b.is_installed()).collect())
}

/// Validate `manifest` and write it for every installed browser.
///
/// Existing files are overwritten. Returns the paths written, which is empty
/// when no supported browser is present.
///
/// On Windows Chrome only finds hosts through `HKCU`, so without feature
/// `windows-registry` this fails with [`InstallError::RegistryUnsupported`]
/// before any file is written.
pub fn install(manifest: &Manifest) -> Result<Vec<PathBuf>, InstallError> {
    manifest.validate()?;
    if cfg!(any(target_os = "linux", target_os = "macos")) && !manifest.path.is_absolute() {
        return Err(InstallError::RelativePath(manifest.path.clone()));
    }

    let targets = installed_browsers()?;
    ensure_registry_support(&targets, &manifest.name)?;

    let json = manifest.to_json()?;
    let mut written = Vec::new();
    for browser in targets {
        let path = browser.manifest_path(&manifest.name)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, &json)?;
        info!(browser = %browser.key, path = %path.display(), "manifest written");

        if let Some(key) = browser.registry_key_path(&manifest.name) {
            register(&key, &path)?;
        }
        written.push(path);
    }
    Ok(written)
}

/// Validate `manifest`, then delete its file (and the directory, if left
/// empty) and registry entry for every configured browser. Missing files and
/// keys are skipped.
pub fn uninstall(manifest: &Manifest) -> Result<(), InstallError> {
    manifest.validate()?;

    for browser in browsers()? {
        if browser.locations().is_none() {
            continue;
        }
        let path = browser.manifest_path(&manifest.name)?;
        remove_file_and_empty_parent(&path)?;

        if let Some(key) = browser.registry_key_path(&manifest.name) {
            unregister(&key)?;
        }
    }
    Ok(())
}

/// `true` if a manifest named `host_name` exists for any configured browser.
pub fn verify_installed(host_name: &str) -> Result<bool, InstallError> {
    for browser in browsers()? {
        if browser.locations().is_none() {
            continue;
        }
        if browser.manifest_path(host_name)?.is_file() {
            return Ok(true);
        }
    }
    Ok(false)
}

const REGISTRY_SUPPORT: bool = cfg!(all(windows, feature = "windows-registry"));

fn ensure_registry_support(targets: &[&Browser], host_name: &str) -> Result<(), InstallError> {
    if REGISTRY_SUPPORT {
        return Ok(());
    }
    match targets
        .iter()
        .find(|b| b.registry_key_path(host_name).is_some())
    {
        Some(b) => Err(InstallError::RegistryUnsupported(b.key.clone())),
        None => Ok(()),
    }
}

fn remove_file_and_empty_parent(path: &Path) -> io::Result<()> {
    if !path.is_file() {
        return Ok(());
    }
    fs::remove_file(path)?;
    debug!(path = %path.display(), "manifest removed");

    if let Some(dir) = path.parent() {
        if fs::read_dir(dir)?.next().is_none() {
            fs::remove_dir(dir)?;
        }
    }
    Ok(())
}

#[cfg(all(windows, feature = "windows-registry"))]
fn register(key: &str, manifest_path: &Path) -> Result<(), InstallError> {
    self::winreg::write_manifest_reg(key, manifest_path)?;
    Ok(())
}

#[cfg(all(windows, feature = "windows-registry"))]
fn unregister(key: &str) -> Result<(), InstallError> {
    self::winreg::remove_manifest_reg(key)?;
    Ok(())
}

// Unreachable with a registry key: `install` rejects those browsers up front.
#[cfg(not(all(windows, feature = "windows-registry")))]
fn register(key: &str, _manifest_path: &Path) -> Result<(), InstallError> {
    Err(InstallError::RegistryUnsupported(key.to_string()))
}

#[cfg(not(all(windows, feature = "windows-registry")))]
fn unregister(_key: &str) -> Result<(), InstallError> {
    Ok(())
}
