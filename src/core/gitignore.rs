//! `.gitignore` maintenance.
//!
//! Tracked files and the `.satchel` directory must never be committed:
//! the working-tree copies are symlinks into the plaintext cache.

use std::path::Path;

use crate::error::Result;

/// Add `entry` to the project's `.gitignore`, creating the file if needed.
/// Idempotent.
pub fn ignore(root: &Path, entry: &str) -> Result<()> {
    let path = root.join(".gitignore");

    let existing = if path.exists() {
        std::fs::read_to_string(&path)?
    } else {
        String::new()
    };

    if existing.lines().any(|l| l.trim() == entry) {
        return Ok(());
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(entry);
    updated.push('\n');

    std::fs::write(&path, updated)?;
    Ok(())
}

/// Remove `entry` from the project's `.gitignore` if present.
pub fn unignore(root: &Path, entry: &str) -> Result<()> {
    let path = root.join(".gitignore");
    if !path.exists() {
        return Ok(());
    }

    let existing = std::fs::read_to_string(&path)?;
    let filtered: Vec<&str> = existing.lines().filter(|l| l.trim() != entry).collect();

    let mut updated = filtered.join("\n");
    if !updated.is_empty() {
        updated.push('\n');
    }

    std::fs::write(&path, updated)?;
    Ok(())
}
