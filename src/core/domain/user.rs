//! User identity as returned by the login handshake.

use serde::{Deserialize, Serialize};

use super::KeyRing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Github,
    Gitlab,
    Custom,
}

/// A user known to the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub account_type: AccountType,
    /// Stable identifier, e.g. `alice@github`.
    pub user_id: String,
    /// Identifier on the third-party provider.
    #[serde(default)]
    pub ext_id: String,
    pub username: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    /// Registered public keys.
    #[serde(default)]
    pub keys: KeyRing,
}

impl Default for AccountType {
    fn default() -> Self {
        AccountType::Custom
    }
}
