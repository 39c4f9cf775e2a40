//! Environment lifecycle and whole-environment secret access.

use std::collections::BTreeMap;

use tracing::debug;

use super::{EnvStore, DEFAULT_ENVIRONMENT};
use crate::core::envfile::EnvFile;
use crate::error::{Result, StoreError};

impl EnvStore {
    /// Names of all environments.
    ///
    /// Always contains "default" first; the rest are discovered from the
    /// cache directories, deduplicated.
    pub fn list_environments(&self) -> Result<Vec<String>> {
        let mut envs = vec![DEFAULT_ENVIRONMENT.to_string()];

        let entries = match std::fs::read_dir(self.cache_dir()) {
            Ok(entries) => entries,
            Err(_) => return Ok(envs),
        };

        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !envs.contains(&name) {
                envs.push(name);
            }
        }

        Ok(envs)
    }

    pub fn has_environment(&self, name: &str) -> bool {
        name == DEFAULT_ENVIRONMENT || self.env_dir(name).is_dir()
    }

    /// Create an empty environment.
    ///
    /// Only the cache directory is created; no secrets or files are
    /// populated into it.
    pub fn create_environment(&self, name: &str) -> Result<()> {
        if self.env_dir(name).exists() {
            return Err(StoreError::EnvironmentExists(name.to_string()).into());
        }

        debug!(environment = name, "creating environment");
        std::fs::create_dir_all(self.env_dir(name))?;
        // An empty store file, so switching here works immediately.
        std::fs::write(self.env_store_path(name), "")?;
        Ok(())
    }

    /// Delete an environment's cache tree. Irreversible.
    pub fn remove_environment(&self, name: &str) -> Result<()> {
        if self.current_environment()? == name {
            return Err(StoreError::CannotRemoveCurrent(name.to_string()).into());
        }

        if !self.has_environment(name) {
            return Err(self.not_found(name));
        }

        debug!(environment = name, "removing environment");
        std::fs::remove_dir_all(self.env_dir(name))?;
        Ok(())
    }

    /// All stored values of one environment.
    pub fn get_all_secrets(&self, name: &str) -> Result<BTreeMap<String, String>> {
        if !self.has_environment(name) {
            return Err(self.not_found(name));
        }

        Ok(EnvFile::load(self.env_store_path(name))?.data())
    }

    /// Replace the whole value set of one environment.
    pub fn set_all_secrets(&self, name: &str, secrets: &BTreeMap<String, String>) -> Result<()> {
        if !self.has_environment(name) {
            return Err(self.not_found(name));
        }

        let mut store = EnvFile::load(self.env_store_path(name))?;
        store.set_all(secrets);
        store.save()
    }
}
