//! Reading the list of vaults to drain.

use std::path::Path;
use tracing::error;

use crate::error::DrainError;

/// Read vault names, one per line. Surrounding whitespace is trimmed and blank lines skipped.
///
/// An empty file yields an empty list; deciding what to do about that is up to the caller.
pub fn load(path: &Path) -> Result<Vec<String>, DrainError> {
    let content = std::fs::read_to_string(path).map_err(|source| DrainError::VaultList {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse(&content))
}

/// Load the list for a run. An unreadable or empty list is logged and yields `None`:
/// the run then ends with nothing processed, which is not a process failure.
pub fn load_for_run(path: &Path) -> Option<Vec<String>> {
    match load(path) {
        Ok(vaults) if vaults.is_empty() => {
            error!(
                path = %path.display(),
                "No vaults to process. Ensure the vault list contains vault names."
            );
            None
        }
        Ok(vaults) => Some(vaults),
        Err(e) => {
            error!(error = %e, "Cannot read vault list");
            None
        }
    }
}

pub fn parse(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
