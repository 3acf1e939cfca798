use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{env, path::PathBuf};

use super::InstallError;

const EMBEDDED_BROWSERS: &str = include_str!("browsers.toml");

static BROWSERS: Lazy<Result<BrowsersFile, toml::de::Error>> =
    Lazy::new(|| toml::from_str(EMBEDDED_BROWSERS));

#[derive(Debug, Deserialize)]
struct BrowsersFile {
    browser: Vec<Browser>,
}

/// One browser entry from the embedded `browsers.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Browser {
    /// Short key, e.g. `chrome`.
    pub key: String,
    /// Display name, e.g. `Google Chrome`.
    pub name: String,
    linux: Option<Locations>,
    macos: Option<Locations>,
    windows: Option<Locations>,
}

/// Per-OS location templates. `{VAR}` expands to environment variable `VAR`.
#[derive(Debug, Clone, Deserialize)]
pub struct Locations {
    pub user_data_dir: String,
    pub manifest_dir: String,
    #[serde(default)]
    pub registry_key: Option<String>,
}

/// All configured browsers, in file order.
pub fn browsers() -> Result<&'static [Browser], InstallError> {
    match &*BROWSERS {
        Ok(file) => Ok(&file.browser),
        Err(e) => Err(InstallError::Config(e.to_string())),
    }
}

/// Look up a browser by key.
pub fn browser(key: &str) -> Result<&'static Browser, InstallError> {
    browsers()?
        .iter()
        .find(|b| b.key == key)
        .ok_or_else(|| InstallError::UnknownBrowser(key.to_string()))
}

impl Browser {
    /// Location templates for the OS this binary was built for.
    pub fn locations(&self) -> Option<&Locations> {
        if cfg!(target_os = "windows") {
            self.windows.as_ref()
        } else if cfg!(target_os = "macos") {
            self.macos.as_ref()
        } else {
            self.linux.as_ref()
        }
    }

    fn current(&self) -> Result<&Locations, InstallError> {
        self.locations()
            .ok_or_else(|| InstallError::UnsupportedPlatform(self.key.clone()))
    }

    /// The profile root whose existence means "this browser is installed".
    pub fn user_data_dir(&self) -> Result<PathBuf, InstallError> {
        expand(&self.current()?.user_data_dir).map(PathBuf::from)
    }

    /// Where the manifest for `host_name` lives.
    pub fn manifest_path(&self, host_name: &str) -> Result<PathBuf, InstallError> {
        let dir = expand(&self.current()?.manifest_dir)?;
        Ok(PathBuf::from(dir).join(format!("{host_name}.json")))
    }

    /// `HKCU` sub-key pointing at the manifest, if this OS uses one.
    pub fn registry_key_path(&self, host_name: &str) -> Option<String> {
        self.locations()?
            .registry_key
            .as_ref()
            .map(|key| format!(r"{key}\{host_name}"))
    }

    pub fn is_installed(&self) -> bool {
        self.user_data_dir().is_ok_and(|dir| dir.is_dir())
    }
}

/// Replace every `{VAR}` in `template` with the value of environment variable `VAR`.
pub fn expand(template: &str) -> Result<String, InstallError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| InstallError::Config(format!("unclosed placeholder in {template:?}")))?;
        let var = &after[..end];
        let value = env::var(var).map_err(|_| InstallError::MissingEnv(var.to_string()))?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
