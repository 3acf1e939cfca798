use std::{io, path::Path};
use winreg::{enums::HKEY_CURRENT_USER, RegKey};

/// Create `HKCU\<key_path>` and set its default value to the manifest path.
pub fn write_manifest_reg(key_path: &str, manifest_path: &Path) -> io::Result<()> {
    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let (key, _) = hkcu.create_subkey(key_path)?;
    key.set_value("", &manifest_path.to_string_lossy().as_ref())?;
    Ok(())
}

/// Read the manifest path `HKCU\<key_path>` points at, if the key exists.
pub fn read_manifest_reg(key_path: &str) -> io::Result<Option<String>> {
    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    match hkcu.open_subkey(key_path) {
        Ok(key) => key.get_value::<String, _>("").map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Delete `HKCU\<key_path>`. A missing key is not an error.
pub fn remove_manifest_reg(key_path: &str) -> io::Result<()> {
    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    match hkcu.delete_subkey(key_path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
