//! Discovery module: Find .docseek root by walking up the directory tree

use std::path::{Path, PathBuf};

use crate::{DOCSEEK_DIR, DocseekError, Result};

/// Find the .docseek root directory by walking up from the given path.
///
/// Returns the path to the directory containing .docseek (not the .docseek folder itself).
pub fn find_root(start: &Path) -> Result<PathBuf> {
    let mut current = start.canonicalize()?;

    loop {
        if docseek_dir(&current).is_dir() {
            return Ok(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return Err(DocseekError::NotInRepo),
        }
    }
}

/// Get the .docseek directory path for a given root.
pub fn docseek_dir(root: &Path) -> PathBuf {
    root.join(DOCSEEK_DIR)
}

/// Get the config file path.
pub fn config_path(root: &Path) -> PathBuf {
    docseek_dir(root).join("config.json")
}

/// Create the .docseek directory for a new repository.
pub fn init(root: &Path) -> Result<PathBuf> {
    let dir = docseek_dir(root);
    if dir.exists() {
        return Err(DocseekError::AlreadyInitialized(dir));
    }
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
