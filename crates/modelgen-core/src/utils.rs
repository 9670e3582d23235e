use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

/// Write content to a file, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Pretty CLI output helpers using the `colored` crate.
pub mod ui {
    use colored::Colorize;

    /// Print a "create" action (green)
    pub fn created(path: &str) {
        println!("  {} {}", "create".green(), path);
    }

    /// Print an "update" action (cyan)
    pub fn updated(path: &str) {
        println!("  {} {}", "update".cyan(), path);
    }

    /// Print a "skip" action (yellow)
    pub fn skipped(path: &str, reason: &str) {
        println!("  {} {} ({})", "skip".yellow(), path, reason);
    }

    /// Print a "run" action (blue)
    pub fn running(command: &str) {
        println!("  {} {}", "run".blue(), command);
    }

    /// Print an "inject" action (magenta)
    pub fn injected(target: &str, what: &str) {
        println!("  {} {} → {}", "inject".magenta(), what, target);
    }

    /// Print a section header (bold)
    pub fn section(title: &str) {
        println!("\n{}", title.bold());
    }

    /// Print a success message (green bold)
    pub fn success(msg: &str) {
        println!("\n{}", msg.green().bold());
    }

    /// Print a warning (yellow)
    pub fn warn(msg: &str) {
        println!("  {} {}", "warn".yellow(), msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c/test.txt");
        write_file(&path, "hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn write_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        write_file(&path, "first").unwrap();
        write_file(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}
