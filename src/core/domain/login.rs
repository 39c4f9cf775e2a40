//! Login request state, as exchanged with the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending third-party login.
///
/// Created when a login begins; the identity provider's redirect sets
/// `auth_code` exactly once; the request is discarded after the handshake
/// completes or times out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub id: u64,
    /// Client-visible handle used to poll for completion.
    pub temporary_code: String,
    /// Set by the provider redirect callback; empty until then.
    #[serde(default)]
    pub auth_code: String,
    #[serde(default)]
    pub answered: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl LoginRequest {
    /// Whether the provider redirect has arrived.
    pub fn is_answered(&self) -> bool {
        !self.auth_code.is_empty()
    }
}
