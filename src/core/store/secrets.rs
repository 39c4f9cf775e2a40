//! Secret CRUD.
//!
//! Declarations live in the project manifest; values live in the
//! per-environment stores. Multi-environment writes are executed
//! per-environment with no rollback: the first failure aborts the
//! remaining iterations and earlier writes stay in place. Callers see
//! at-least-attempted, non-transactional behavior.

use std::collections::BTreeMap;

use tracing::debug;

use super::{copy_file, EnvStore, DEFAULT_ENVIRONMENT};
use crate::core::domain::Secret;
use crate::core::envfile::EnvFile;
use crate::error::{Result, StoreError};

impl EnvStore {
    /// Declare a secret and write its per-environment values.
    ///
    /// The declaration replaces any prior one of the same name. Values are
    /// then written environment by environment; the cache directory is
    /// created on demand only for "default". Any other named-but-absent
    /// environment aborts the whole call with the environments written so
    /// far left in place. Finally the active slot is refreshed from the
    /// current environment.
    pub fn add_secret(
        &self,
        name: &str,
        values: &BTreeMap<String, String>,
        required: bool,
    ) -> Result<()> {
        debug!(secret = name, environments = values.len(), "adding secret");

        let mut manifest = self.manifest()?;
        manifest.set_secret(name, required);
        manifest.save()?;

        for (environment, value) in values {
            if !self.env_dir(environment).is_dir() {
                if environment == DEFAULT_ENVIRONMENT {
                    std::fs::create_dir_all(self.env_dir(environment))?;
                } else {
                    // No rollback of environments already written.
                    return Err(self.not_found(environment));
                }
            }

            let mut store = EnvFile::load(self.env_store_path(environment))?;
            store.set(name, value);
            store.save()?;
        }

        self.refresh_active_slot()
    }

    /// Unregister a secret and delete its value from every environment.
    ///
    /// Same non-transactional caveat as [`add_secret`](Self::add_secret).
    pub fn remove_secret(&self, name: &str) -> Result<()> {
        debug!(secret = name, "removing secret");

        let mut manifest = self.manifest()?;
        manifest.unset_secret(name);
        manifest.save()?;

        for environment in self.list_environments()? {
            let mut store = EnvFile::load(self.env_store_path(&environment))?;
            store.unset(name);
            store.save()?;
        }

        self.refresh_active_slot()
    }

    /// Reassemble the declared secret's per-environment view.
    ///
    /// Environments without a stored value are omitted from the map.
    pub fn get_secret(&self, name: &str) -> Result<Secret> {
        let manifest = self.manifest()?;
        let decl = manifest
            .secret(name)
            .ok_or_else(|| StoreError::SecretNotFound(name.to_string()))?;

        let mut values = BTreeMap::new();
        for environment in self.list_environments()? {
            let store = EnvFile::load(self.env_store_path(&environment))?;
            if let Some(value) = store.get(name) {
                values.insert(environment, value.to_string());
            }
        }

        Ok(Secret {
            name: decl.key.clone(),
            required: decl.required,
            values,
        })
    }

    /// All declared secrets with their per-environment views.
    pub fn list_secrets(&self) -> Result<Vec<Secret>> {
        let manifest = self.manifest()?;

        let mut stores = Vec::new();
        for environment in self.list_environments()? {
            stores.push((
                environment.clone(),
                EnvFile::load(self.env_store_path(&environment))?,
            ));
        }

        Ok(manifest
            .secrets
            .iter()
            .map(|decl| {
                let mut values = BTreeMap::new();
                for (environment, store) in &stores {
                    if let Some(value) = store.get(&decl.key) {
                        values.insert(environment.clone(), value.to_string());
                    }
                }
                Secret {
                    name: decl.key.clone(),
                    required: decl.required,
                    values,
                }
            })
            .collect())
    }

    /// Whether the manifest declares the secret. Values are not consulted.
    pub fn has_secret(&self, name: &str) -> Result<bool> {
        Ok(self.manifest()?.secret(name).is_some())
    }

    pub fn secret_is_required(&self, name: &str) -> Result<bool> {
        Ok(self
            .manifest()?
            .secret(name)
            .map(|s| s.required)
            .unwrap_or(false))
    }

    /// Flip the required flag on the declaration.
    pub fn mark_secret_required(&self, name: &str, required: bool) -> Result<()> {
        let mut manifest = self.manifest()?;
        if manifest.secret(name).is_none() {
            return Err(StoreError::SecretNotFound(name.to_string()).into());
        }
        manifest.set_secret(name, required);
        manifest.save()
    }

    /// Resolved secrets of the current environment.
    ///
    /// Reads the active slot, then overlays any local override file at the
    /// project root key by key, override wins. The overlay is read-time
    /// only and never written back into the cache.
    pub fn get_secrets(&self) -> Result<BTreeMap<String, String>> {
        let mut secrets = EnvFile::load(self.active_store_path())?.data();

        let override_path = self.override_path();
        if override_path.is_file() {
            let overrides = EnvFile::load(&override_path)?;
            for (key, value) in overrides.entries() {
                secrets.insert(key.clone(), value.clone());
            }
        }

        Ok(secrets)
    }

    /// Copy the current environment's store into the active slot.
    pub(crate) fn refresh_active_slot(&self) -> Result<()> {
        let current = self.current_environment()?;
        let from = self.env_store_path(&current);

        if !from.exists() {
            // A freshly created environment has no store file yet.
            std::fs::write(self.active_store_path(), "")?;
            return Ok(());
        }

        copy_file(&from, &self.active_store_path())
    }
}
