//! Tracked-file projection.
//!
//! A tracked file's real content lives in the per-environment cache; the
//! working-tree path is a symlink into the *current* environment's cache
//! subtree. Switching environments relinks every tracked file.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, trace};

use super::{copy_file, EnvStore};
use crate::core::gitignore;
use crate::error::{Result, StoreError};

impl EnvStore {
    /// Start tracking a working-tree file.
    ///
    /// The current working-tree content becomes the current environment's
    /// cached copy; `other_environments` supplies initial content for any
    /// other environment (entries for the current environment are
    /// ignored). The working-tree path is then replaced by a symlink into
    /// the current environment's cache and added to `.gitignore`.
    pub fn add_file(
        &self,
        path: &str,
        other_environments: &BTreeMap<String, Vec<u8>>,
    ) -> Result<()> {
        debug!(file = path, "tracking file");

        let working = self.root().join(path);
        let current = self.current_environment()?;

        let mut manifest = self.manifest()?;
        manifest.add_file(path);
        manifest.save()?;

        let cached = self.env_dir(&current).join(path);
        if let Some(parent) = cached.parent() {
            std::fs::create_dir_all(parent)?;
        }
        copy_file(&working, &cached)?;

        for (environment, contents) in other_environments {
            if environment == &current {
                continue;
            }
            if !self.env_dir(environment).is_dir() {
                return Err(self.not_found(environment));
            }

            let dest = self.env_dir(environment).join(path);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(dest, contents)?;
        }

        link_into_place(&cached, &working)?;
        gitignore::ignore(self.root(), path)?;

        Ok(())
    }

    /// Stop tracking a file.
    ///
    /// With `force` the working-tree copy is deleted first; otherwise the
    /// symlink alone is removed. Either way the current environment's
    /// cached content is copied back over the working-tree location (a
    /// failed restore is logged and skipped so an untrack never wedges on
    /// a missing cache entry), every environment's cached copy is
    /// deleted, and the `.gitignore` entry is removed.
    pub fn remove_file(&self, path: &str, force: bool) -> Result<()> {
        let mut manifest = self.manifest()?;
        if !manifest.tracks_file(path) {
            return Err(StoreError::FileNotTracked(path.to_string()).into());
        }

        debug!(file = path, force, "untracking file");
        manifest.remove_file(path);
        manifest.save()?;

        let working = self.root().join(path);
        let current = self.current_environment()?;
        let cached = self.env_dir(&current).join(path);

        if force {
            if working.is_symlink() || working.exists() {
                std::fs::remove_file(&working)?;
            }
        } else if working.is_symlink() {
            // Drop the link so the restore lands as a plain file.
            std::fs::remove_file(&working)?;
        }
        if let Err(e) = copy_file(&cached, &working) {
            trace!(file = path, error = %e, "no cached copy to restore");
        }

        for environment in self.list_environments()? {
            let copy = self.env_dir(&environment).join(path);
            if copy.exists() {
                std::fs::remove_file(copy)?;
            }
        }

        gitignore::unignore(self.root(), path)?;

        Ok(())
    }

    /// Repoint every tracked file's symlink at `environment`'s cache.
    ///
    /// Aborts on the first file that has no cached copy in the target
    /// environment, leaving already-relinked files pointing at the new
    /// environment and the rest at the old one.
    pub fn files_use_environment(&self, environment: &str) -> Result<()> {
        for path in self.list_files()? {
            let cached = self.env_dir(environment).join(&path);
            if !cached.exists() {
                return Err(StoreError::FileNotInEnvironment {
                    path,
                    environment: environment.to_string(),
                }
                .into());
            }

            link_into_place(&cached, &self.root().join(&path))?;
        }

        Ok(())
    }

    /// Tracked file paths, relative to the project root.
    pub fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.manifest()?.files.clone())
    }

    /// Cached content of one tracked file in one environment.
    pub fn get_file(&self, environment: &str, path: &str) -> Result<Vec<u8>> {
        if !self.manifest()?.tracks_file(path) {
            return Err(StoreError::FileNotTracked(path.to_string()).into());
        }

        let cached = self.env_dir(environment).join(path);
        if !cached.exists() {
            return Err(StoreError::FileNotInEnvironment {
                path: path.to_string(),
                environment: environment.to_string(),
            }
            .into());
        }

        Ok(std::fs::read(cached)?)
    }

    /// Replace the cached content of one tracked file in one environment.
    pub fn set_file(&self, environment: &str, path: &str, contents: &[u8]) -> Result<()> {
        if !self.has_environment(environment) {
            return Err(self.not_found(environment));
        }

        let cached = self.env_dir(environment).join(path);
        if let Some(parent) = cached.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(cached, contents)?;

        Ok(())
    }
}

/// Replace whatever is at `at` with a symlink to `target`.
fn link_into_place(target: &Path, at: &Path) -> Result<()> {
    if at.is_symlink() || at.exists() {
        std::fs::remove_file(at).map_err(|source| StoreError::LinkFailed {
            path: at.display().to_string(),
            source,
        })?;
    }

    symlink(target, at).map_err(|source| {
        StoreError::LinkFailed {
            path: at.display().to_string(),
            source,
        }
        .into()
    })
}

#[cfg(unix)]
fn symlink(target: &Path, at: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, at)
}

#[cfg(windows)]
fn symlink(target: &Path, at: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, at)
}
