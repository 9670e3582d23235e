//! Staging of the `.env` file read by the introspection tool.

use anyhow::{Context as _, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEnv {
    pub env_path: PathBuf,
    /// Set when a previous env file existed and was copied aside.
    pub backup_path: Option<PathBuf>,
}

/// Sibling of `env_path` with `.bak` appended to the file name (`.env` → `.env.bak`).
pub fn backup_path(env_path: &Path) -> PathBuf {
    let mut name = env_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from(".env"));
    name.push(".bak");
    env_path.with_file_name(name)
}

/// The single line written to the env file. No trailing newline.
pub fn env_line(variable: &str, database: &Path) -> String {
    format!("{}={}", variable, database.display())
}

/// Back up any existing env file, then overwrite it with `variable=database`.
///
/// The backup is a plain copy and is itself overwritten on every run. Nothing
/// is rolled back if a later step fails.
pub fn stage(env_path: &Path, variable: &str, database: &Path) -> Result<StagedEnv> {
    let backup = if env_path.is_file() {
        let backup = backup_path(env_path);
        fs::copy(env_path, &backup).with_context(|| {
            format!(
                "Failed to back up {} to {}",
                env_path.display(),
                backup.display()
            )
        })?;
        Some(backup)
    } else {
        None
    };

    crate::utils::write_file(env_path, &env_line(variable, database))?;

    Ok(StagedEnv {
        env_path: env_path.to_path_buf(),
        backup_path: backup,
    })
}
