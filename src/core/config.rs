//! Account configuration.
//!
//! Logged-in accounts, the current account index, the session token and
//! the server URL live in `~/.config/satchel/config.toml`. The struct is
//! loaded once at process start and passed by reference; nothing reads a
//! global config store at call sites.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::domain::AccountType;
use crate::error::{ConfigError, Result};

pub const DEFAULT_SERVER_URL: &str = "https://api.satchel.dev";

/// One logged-in account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_type: AccountType,
    pub user_id: String,
    #[serde(default)]
    pub ext_id: String,
    pub username: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    /// Public encryption key registered with the server.
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(skip)]
    path: PathBuf,

    #[serde(default)]
    pub server_url: String,
    /// Index into `accounts` of the active account.
    #[serde(default)]
    pub current: Option<usize>,
    /// Session token for authenticated calls.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default, rename = "account")]
    pub accounts: Vec<Account>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            current: None,
            auth_token: None,
            accounts: Vec::new(),
        }
    }
}

impl AccountConfig {
    /// Default config file location.
    ///
    /// `SATCHEL_CONFIG_DIR` overrides the platform config directory, which
    /// keeps tests and CI hermetic.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("SATCHEL_CONFIG_DIR") {
            return Ok(PathBuf::from(dir).join("config.toml"));
        }

        let base = dirs::config_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(base.join("satchel").join("config.toml"))
    }

    /// Load from the default location, an empty config if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from an explicit path, an empty config if absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading account config");

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
            toml::from_str::<Self>(&contents).map_err(ConfigError::Parse)?
        } else {
            Self::default()
        };

        config.path = path.to_path_buf();
        if config.server_url.is_empty() {
            config.server_url = DEFAULT_SERVER_URL.to_string();
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    pub fn current_account(&self) -> Option<&Account> {
        self.current.and_then(|i| self.accounts.get(i))
    }

    /// The session token, or `NotLoggedIn`.
    pub fn auth_token(&self) -> Result<&str> {
        self.auth_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::NotLoggedIn.into())
    }

    /// Append an account and make it current.
    pub fn add_account(&mut self, account: Account, token: String) {
        self.accounts.push(account);
        self.current = Some(self.accounts.len() - 1);
        self.auth_token = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn account(user: &str) -> Account {
        Account {
            account_type: AccountType::Github,
            user_id: format!("{user}@github"),
            ext_id: "42".into(),
            username: user.into(),
            fullname: String::new(),
            email: format!("{user}@example.com"),
            public_key: "age1qyqszqgpqyqszqgpqyqszqgpqyqszqgp".into(),
        }
    }

    #[test]
    fn empty_config_when_file_absent() {
        let tmp = TempDir::new().unwrap();
        let config = AccountConfig::load_from(&tmp.path().join("config.toml")).unwrap();

        assert!(config.accounts.is_empty());
        assert!(config.current_account().is_none());
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn auth_token_requires_login() {
        let tmp = TempDir::new().unwrap();
        let mut config = AccountConfig::load_from(&tmp.path().join("config.toml")).unwrap();

        assert!(config.auth_token().is_err());

        config.add_account(account("alice"), "tok-123".into());
        assert_eq!(config.auth_token().unwrap(), "tok-123");
    }

    #[test]
    fn save_load_keeps_current_account() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let mut config = AccountConfig::load_from(&path).unwrap();
        config.add_account(account("alice"), "tok".into());
        config.add_account(account("bob"), "tok2".into());
        config.save().unwrap();

        let loaded = AccountConfig::load_from(&path).unwrap();
        assert_eq!(loaded.accounts.len(), 2);
        assert_eq!(loaded.current_account().unwrap().username, "bob");
        assert_eq!(loaded.auth_token().unwrap(), "tok2");
    }
}
