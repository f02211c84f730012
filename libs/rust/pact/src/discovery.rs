//! Contract file discovery.

use crate::error::ContractError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of contract files.
pub const CONTRACT_EXTENSION: &str = "json";

/// List the contract files directly inside `directory`.
///
/// Matches regular files with a `.json` extension, skips hidden files (names
/// starting with `.`) and does not descend into subdirectories. The result is
/// sorted by file name so reports are stable across filesystems. A directory
/// that does not exist holds no contracts.
///
/// # Errors
///
/// Returns [`ContractError::Io`] if the directory exists but cannot be listed.
pub fn discover_contract_files(directory: &Path) -> Result<Vec<PathBuf>, ContractError> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(directory = %directory.display(), "contract directory does not exist");
            return Ok(Vec::new());
        }
        Err(err) => return Err(ContractError::io(directory, err)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ContractError::io(directory, err))?;
        let path = entry.path();
        if is_contract_file(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(directory = %directory.display(), count = files.len(), "discovered contract files");
    Ok(files)
}

/// Check whether `path` names a visible `.json` regular file.
#[must_use]
pub fn is_contract_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    path.extension().is_some_and(|ext| ext == CONTRACT_EXTENSION) && path.is_file()
}
