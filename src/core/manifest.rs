//! Project manifest (`satchel.toml`).
//!
//! The manifest is the project-root declaration file: project identity,
//! declared secret names with their required flag, tracked file paths, and
//! the known server-side environments with their version markers. Values
//! never live here; they live in the per-environment cache stores.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

pub const MANIFEST_FILE: &str = "satchel.toml";

/// A declared secret: name and strictness, no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDecl {
    pub key: String,
    /// Required secrets must be non-empty at deploy time.
    #[serde(default)]
    pub required: bool,
}

/// A server-side environment the project knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentRef {
    pub name: String,
    /// Server identifier for the environment.
    #[serde(default)]
    pub environment_id: String,
    /// Opaque marker of the last synchronized state.
    #[serde(default)]
    pub version_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(skip)]
    path: PathBuf,

    pub project_id: String,
    pub project_name: String,
    #[serde(default, rename = "secret")]
    pub secrets: Vec<SecretDecl>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, rename = "environment")]
    pub environments: Vec<EnvironmentRef>,
}

impl Manifest {
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }

    pub fn exists_in(root: &Path) -> bool {
        Self::path_in(root).exists()
    }

    /// A fresh manifest for a new project.
    pub fn new(root: &Path, project_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: Self::path_in(root),
            project_id: project_id.into(),
            project_name: name.into(),
            ..Default::default()
        }
    }

    /// Load the manifest from `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotInitialized`] if no manifest exists.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path_in(root);
        debug!(path = %path.display(), "loading manifest");

        if !path.exists() {
            return Err(ConfigError::NotInitialized.into());
        }

        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
        let mut manifest: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        manifest.path = path;

        Ok(manifest)
    }

    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Upsert a secret declaration, replacing any prior one of the same name.
    pub fn set_secret(&mut self, key: &str, required: bool) -> &mut Self {
        self.unset_secret(key);
        self.secrets.push(SecretDecl {
            key: key.to_string(),
            required,
        });
        self
    }

    pub fn unset_secret(&mut self, key: &str) -> &mut Self {
        self.secrets.retain(|s| s.key != key);
        self
    }

    pub fn secret(&self, key: &str) -> Option<&SecretDecl> {
        self.secrets.iter().find(|s| s.key == key)
    }

    /// Register a tracked file path, replacing any prior registration.
    pub fn add_file(&mut self, path: &str) -> &mut Self {
        self.remove_file(path);
        self.files.push(path.to_string());
        self
    }

    pub fn remove_file(&mut self, path: &str) -> &mut Self {
        self.files.retain(|f| f != path);
        self
    }

    pub fn tracks_file(&self, path: &str) -> bool {
        self.files.iter().any(|f| f == path)
    }

    pub fn environment(&self, name: &str) -> Option<&EnvironmentRef> {
        self.environments.iter().find(|e| e.name == name)
    }

    /// Record the latest synchronized version marker for an environment,
    /// creating the entry if the environment is new to the manifest.
    pub fn set_environment_version(&mut self, name: &str, environment_id: &str, version_id: &str) {
        match self.environments.iter_mut().find(|e| e.name == name) {
            Some(env) => {
                env.environment_id = environment_id.to_string();
                env.version_id = version_id.to_string();
            }
            None => self.environments.push(EnvironmentRef {
                name: name.to_string(),
                environment_id: environment_id.to_string(),
                version_id: version_id.to_string(),
            }),
        }
    }
}
