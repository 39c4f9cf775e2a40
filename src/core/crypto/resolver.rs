//! Private key resolution.
//!
//! Decryption needs a local private key whose derived public key equals
//! the payload's target. [`KeyResolver`] is the capability seam:
//! [`SshDirResolver`] scans a conventional key directory and shells out to
//! `ssh-keygen` (an explicit external collaborator) to derive candidate
//! public keys; [`StaticResolver`] carries explicit key material for tests,
//! OS keyrings, or hardware tokens.

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, trace};

use crate::core::domain::keyring::SSH_KEY_PREFIX;
use crate::error::{CryptoError, Result};

/// Locates the private identity matching a public key.
pub trait KeyResolver {
    /// Resolve `public_key` to a usable age identity.
    ///
    /// # Errors
    ///
    /// `CryptoError::KeyNotFound` when no local identity matches.
    fn resolve(&self, public_key: &str) -> Result<Box<dyn age::Identity>>;
}

/// Filesystem scanner over a key directory (`~/.ssh` by default).
///
/// For SSH targets, every candidate private-key file is fed to the
/// external `ssh-keygen -y -f` derivation and the output compared against
/// the target. For x25519 targets, candidate files are parsed as age
/// identities and their public halves compared.
pub struct SshDirResolver {
    dir: PathBuf,
}

impl SshDirResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolver over the conventional `~/.ssh` directory.
    pub fn conventional() -> Result<Self> {
        let home = dirs::home_dir().ok_or(crate::error::ConfigError::NoHomeDir)?;
        Ok(Self::new(home.join(".ssh")))
    }

    fn candidate_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect()
    }

    fn resolve_ssh(&self, public_key: &str) -> Result<Box<dyn age::Identity>> {
        let target = key_fields(public_key);

        for path in self.candidate_files() {
            let Ok(contents) = std::fs::read_to_string(&path) else {
                continue;
            };
            if !contents.contains("PRIVATE KEY") {
                continue;
            }

            let derived = match derive_public_key(&path) {
                Ok(derived) => derived,
                Err(e) => {
                    trace!(path = %path.display(), error = %e, "derivation failed, skipping");
                    continue;
                }
            };

            if key_fields(&derived) == target {
                debug!(path = %path.display(), "matched ssh private key");
                let identity = age::ssh::Identity::from_buffer(
                    BufReader::new(contents.as_bytes()),
                    Some(path.display().to_string()),
                )
                .map_err(|e| CryptoError::DecryptFailed(e.to_string()))?;
                return Ok(Box::new(identity));
            }
        }

        Err(CryptoError::KeyNotFound.into())
    }

    fn resolve_x25519(&self, public_key: &str) -> Result<Box<dyn age::Identity>> {
        for path in self.candidate_files() {
            let Ok(contents) = std::fs::read_to_string(&path) else {
                continue;
            };

            for line in contents.lines() {
                let line = line.trim();
                if let Ok(identity) = line.parse::<age::x25519::Identity>() {
                    if identity.to_public().to_string() == public_key {
                        debug!(path = %path.display(), "matched age identity");
                        return Ok(Box::new(identity));
                    }
                }
            }
        }

        Err(CryptoError::KeyNotFound.into())
    }
}

impl KeyResolver for SshDirResolver {
    fn resolve(&self, public_key: &str) -> Result<Box<dyn age::Identity>> {
        if public_key.starts_with(SSH_KEY_PREFIX) {
            self.resolve_ssh(public_key)
        } else {
            self.resolve_x25519(public_key)
        }
    }
}

/// Derive the public key of an on-disk private key through `ssh-keygen`.
///
/// External collaborator: requires `ssh-keygen` on PATH. Substitutable by
/// swapping the whole resolver.
fn derive_public_key(path: &Path) -> Result<String> {
    let output = Command::new("ssh-keygen")
        .arg("-y")
        .arg("-f")
        .arg(path)
        .output()
        .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;

    if !output.status.success() {
        return Err(CryptoError::DerivationFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        )
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Key type and base64 material, ignoring the comment field.
fn key_fields(key_line: &str) -> (String, String) {
    let mut parts = key_line.split_whitespace();
    (
        parts.next().unwrap_or_default().to_string(),
        parts.next().unwrap_or_default().to_string(),
    )
}

/// In-memory resolver over explicit key material.
///
/// Entries are `(public key, private key text)` pairs; private key text is
/// an `AGE-SECRET-KEY-...` line or an SSH private key file body.
#[derive(Default)]
pub struct StaticResolver {
    entries: Vec<(String, String)>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, public_key: impl Into<String>, private_key: impl Into<String>) {
        self.entries.push((public_key.into(), private_key.into()));
    }

    /// Resolver holding a single generated x25519 identity.
    pub fn from_identity(identity: &age::x25519::Identity) -> Self {
        use age::secrecy::ExposeSecret;

        let mut resolver = Self::new();
        resolver.add(
            identity.to_public().to_string(),
            identity.to_string().expose_secret().to_string(),
        );
        resolver
    }
}

impl KeyResolver for StaticResolver {
    fn resolve(&self, public_key: &str) -> Result<Box<dyn age::Identity>> {
        let (_, private) = self
            .entries
            .iter()
            .find(|(public, _)| public == public_key)
            .ok_or(CryptoError::KeyNotFound)?;

        if private.contains("PRIVATE KEY") {
            let identity =
                age::ssh::Identity::from_buffer(BufReader::new(private.as_bytes()), None)
                    .map_err(|e| CryptoError::DecryptFailed(e.to_string()))?;
            Ok(Box::new(identity))
        } else {
            let identity: age::x25519::Identity = private
                .trim()
                .parse()
                .map_err(|e: &str| CryptoError::InvalidKeyFormat(e.to_string()))?;
            Ok(Box::new(identity))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn static_resolver_matches_by_public_key() {
        let identity = age::x25519::Identity::generate();
        let resolver = StaticResolver::from_identity(&identity);

        assert!(resolver
            .resolve(&identity.to_public().to_string())
            .is_ok());
        assert!(matches!(
            resolver.resolve("age1unknown").err().unwrap(),
            crate::error::Error::Crypto(CryptoError::KeyNotFound)
        ));
    }

    #[test]
    fn dir_resolver_finds_age_identity_file() {
        use age::secrecy::ExposeSecret;

        let tmp = TempDir::new().unwrap();
        let identity = age::x25519::Identity::generate();
        std::fs::write(
            tmp.path().join("identity.key"),
            format!("{}\n", identity.to_string().expose_secret()),
        )
        .unwrap();

        let resolver = SshDirResolver::new(tmp.path());
        assert!(resolver
            .resolve(&identity.to_public().to_string())
            .is_ok());
    }

    #[test]
    fn dir_resolver_reports_key_not_found() {
        let tmp = TempDir::new().unwrap();
        let resolver = SshDirResolver::new(tmp.path());

        let err = resolver
            .resolve("age1qyqszqgpqyqszqgpqyqszqgpqyqszqgp")
            .err()
            .unwrap();
        assert!(matches!(
            err,
            crate::error::Error::Crypto(CryptoError::KeyNotFound)
        ));
    }

    #[test]
    fn key_fields_ignores_comment() {
        let a = key_fields("ssh-ed25519 AAAAC3 alice@laptop");
        let b = key_fields("ssh-ed25519 AAAAC3");
        assert_eq!(a, b);
    }
}
