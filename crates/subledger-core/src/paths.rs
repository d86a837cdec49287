use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "subledger", "subledger")
}

/// `$SUBLEDGER_CONFIG` if set, otherwise `config.json` in the platform config dir.
pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SUBLEDGER_CONFIG") {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let dirs = project_dirs().ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join("config.json"))
}

/// Relative data paths (e.g. `database.path`) live under the platform data dir.
pub fn resolve_data_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let dirs = project_dirs().ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.data_dir().join(path))
}
