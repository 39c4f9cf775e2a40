//! Local multi-environment secret and file cache.
//!
//! Every project carries a `.satchel/` directory:
//!
//! ```text
//! .satchel/
//! ├── environment        # active-environment pointer (plain text)
//! └── cache/
//!     ├── .env           # active slot: the current environment's store
//!     ├── default/
//!     │   ├── .env       # per-environment secret store
//!     │   └── <files>    # per-environment tracked-file blobs
//!     ├── dev/
//!     └── prod/
//! ```
//!
//! Tracked working-tree files are symlinks into the *current*
//! environment's cache subtree. The store assumes a single writer:
//! concurrent invocations against the same project directory may
//! interleave writes.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::gitignore;
use crate::core::manifest::Manifest;
use crate::core::pipeline::{self, Step};
use crate::error::{ConfigError, Result, StoreError};

mod environments;
mod files;
mod secrets;

/// Project-local directory holding all cached state.
pub const DOT_DIR: &str = ".satchel";
/// Active-environment pointer file, inside [`DOT_DIR`].
pub const POINTER_FILE: &str = "environment";
/// Cache directory, inside [`DOT_DIR`].
pub const CACHE_DIR: &str = "cache";
/// Per-environment secret store file name.
pub const STORE_FILE: &str = ".env";
/// The synthetic environment every project has.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Handle on one project's environment store.
///
/// Constructed with an explicit project root; nothing in here reads the
/// process working directory or global state.
pub struct EnvStore {
    root: PathBuf,
}

impl EnvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn dot_dir(&self) -> PathBuf {
        self.root.join(DOT_DIR)
    }

    pub(crate) fn pointer_path(&self) -> PathBuf {
        self.dot_dir().join(POINTER_FILE)
    }

    pub(crate) fn cache_dir(&self) -> PathBuf {
        self.dot_dir().join(CACHE_DIR)
    }

    /// Cache directory of one environment.
    pub(crate) fn env_dir(&self, name: &str) -> PathBuf {
        self.cache_dir().join(name)
    }

    /// Secret store file of one environment.
    pub(crate) fn env_store_path(&self, name: &str) -> PathBuf {
        self.env_dir(name).join(STORE_FILE)
    }

    /// The active slot: a copy of the current environment's store.
    pub(crate) fn active_store_path(&self) -> PathBuf {
        self.cache_dir().join(STORE_FILE)
    }

    /// Optional local override file at the project root.
    pub(crate) fn override_path(&self) -> PathBuf {
        self.root.join(STORE_FILE)
    }

    pub(crate) fn manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.root)
    }

    /// Whether the project has been initialized here.
    pub fn is_initialized(&self) -> bool {
        Manifest::exists_in(&self.root) && self.dot_dir().is_dir()
    }

    /// Scaffold the project structure.
    ///
    /// Runs as an ordered pipeline; the first failing step aborts the run
    /// and earlier steps are not undone.
    pub fn init(&self, project_id: &str, project_name: &str) -> Result<()> {
        debug!(root = %self.root.display(), "initializing project");

        pipeline::run([
            Step::new("write manifest", || {
                if !Manifest::exists_in(&self.root) {
                    Manifest::new(&self.root, project_id, project_name).save()?;
                }
                Ok(())
            }),
            Step::new("create dot dir", || {
                Ok(std::fs::create_dir_all(self.dot_dir())?)
            }),
            Step::new("write environment pointer", || {
                if !self.pointer_path().exists() {
                    std::fs::write(self.pointer_path(), DEFAULT_ENVIRONMENT)?;
                }
                Ok(())
            }),
            Step::new("create cache dir", || {
                Ok(std::fs::create_dir_all(self.cache_dir())?)
            }),
            Step::new("create active slot", || {
                if !self.active_store_path().exists() {
                    std::fs::write(self.active_store_path(), "")?;
                }
                Ok(())
            }),
            Step::new("create default environment", || {
                std::fs::create_dir_all(self.env_dir(DEFAULT_ENVIRONMENT))?;
                if !self.env_store_path(DEFAULT_ENVIRONMENT).exists() {
                    std::fs::write(self.env_store_path(DEFAULT_ENVIRONMENT), "")?;
                }
                Ok(())
            }),
            Step::new("gitignore dot dir", || {
                gitignore::ignore(&self.root, DOT_DIR)
            }),
        ])
        .into_result()
    }

    /// Name of the active environment.
    pub fn current_environment(&self) -> Result<String> {
        let contents = std::fs::read_to_string(self.pointer_path())
            .map_err(|_| ConfigError::NotInitialized)?;
        Ok(contents.trim().to_string())
    }

    /// Switch the active environment.
    ///
    /// The sequence is store-copy, pointer-persist, file-relink, in that
    /// order, and is not atomic: a failure partway through the relink
    /// leaves some tracked files pointing at the old environment.
    pub fn set_current(&self, name: &str) -> Result<()> {
        if !self.has_environment(name) {
            return Err(self.not_found(name));
        }

        debug!(environment = name, "switching environment");

        copy_file(&self.env_store_path(name), &self.active_store_path())?;
        std::fs::write(self.pointer_path(), name)?;
        self.files_use_environment(name)?;

        Ok(())
    }

    pub(crate) fn not_found(&self, name: &str) -> crate::error::Error {
        StoreError::EnvironmentNotFound {
            name: name.to_string(),
            available: self
                .list_environments()
                .unwrap_or_default()
                .join(", "),
        }
        .into()
    }
}

/// Copy `from` over `to`, with both paths in the error on failure.
pub(crate) fn copy_file(from: &Path, to: &Path) -> Result<()> {
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|source| {
            StoreError::CopyFailed {
                from: from.display().to_string(),
                to: to.display().to_string(),
                source,
            }
            .into()
        })
}
