//! Per-user public key material.

use serde::{Deserialize, Serialize};

/// Prefix that distinguishes SSH-format public keys from raw x25519
/// recipients (`ssh-ed25519 AAAA...`, `ssh-rsa AAAA...`).
pub const SSH_KEY_PREFIX: &str = "ssh-";

/// A user's public keys: one for encryption, one for signatures.
///
/// The cipher key is either an SSH-format public key or a bare age
/// x25519 recipient; the two are told apart by [`SSH_KEY_PREFIX`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRing {
    /// Public encryption key (SSH format or `age1...`).
    pub cipher: String,
    /// Public signing key.
    pub sign: String,
}

impl KeyRing {
    pub fn new(cipher: impl Into<String>, sign: impl Into<String>) -> Self {
        Self {
            cipher: cipher.into(),
            sign: sign.into(),
        }
    }

    /// Whether the encryption key is an SSH-format key.
    pub fn is_ssh(&self) -> bool {
        self.cipher.starts_with(SSH_KEY_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssh_keys_are_structurally_distinguishable() {
        let ssh = KeyRing::new("ssh-ed25519 AAAAC3Nza...", "");
        let raw = KeyRing::new("age1qyqszqgpqyqszqgpqyqszqgpqyqszqgp", "");

        assert!(ssh.is_ssh());
        assert!(!raw.is_ssh());
    }
}
