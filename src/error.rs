//! Error taxonomy.
//!
//! Each subsystem has its own error enum; all of them fold into the
//! top-level [`Error`] so `?` works across module boundaries. Identity is
//! the variant, rendering is the `Display` impl. The CLI layer in
//! `main.rs` is the only place errors are turned into user-facing text.

use thiserror::Error;

/// Envelope encryption failures.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The public key is neither an SSH key nor a raw x25519 recipient.
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// No local private key matches the target public key.
    #[error("no private key found matching the given public key")]
    KeyNotFound,

    #[error("encryption failed: {0}")]
    EncryptFailed(String),

    /// Malformed ciphertext, or the resolved identity does not match
    /// the scheme the payload was encrypted with.
    #[error("decryption failed: {0}")]
    DecryptFailed(String),

    /// The external key-derivation utility could not be run.
    #[error("key derivation failed: {0}")]
    DerivationFailed(String),
}

/// Permission matrix failures.
///
/// `NoRuleDefined` is a deployment configuration error and is deliberately
/// distinct from `Denied`: callers must be able to tell "the matrix has a
/// hole" apart from "the matrix says no".
#[derive(Error, Debug)]
pub enum RightsError {
    #[error("no permission rule defined for role '{role}' on environment type '{environment_type}'")]
    NoRuleDefined {
        role: String,
        environment_type: String,
    },

    #[error("role '{role}' may not {action} on environment '{environment}'")]
    Denied {
        role: String,
        environment: String,
        action: String,
    },

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown environment type: {0}")]
    UnknownEnvironmentType(String),
}

/// Local environment store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("environment already exists: {0}")]
    EnvironmentExists(String),

    #[error("environment does not exist: {name} (available: {available})")]
    EnvironmentNotFound { name: String, available: String },

    #[error("cannot remove the current environment: {0} (switch first)")]
    CannotRemoveCurrent(String),

    #[error("secret not declared in the project manifest: {0}")]
    SecretNotFound(String),

    #[error("file '{path}' has no cached copy in environment '{environment}'")]
    FileNotInEnvironment { path: String, environment: String },

    #[error("file is not tracked: {0}")]
    FileNotTracked(String),

    #[error("failed to copy {from} to {to}: {source}")]
    CopyFailed {
        from: String,
        to: String,
        source: std::io::Error,
    },

    #[error("failed to link {path}: {source}")]
    LinkFailed {
        path: String,
        source: std::io::Error,
    },
}

/// Server communication failures.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Non-success HTTP status from the server.
    #[error("request failed: {status} {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("login request not found for temporary code")]
    LoginRequestNotFound,

    /// The background poll worker went away without delivering a result.
    #[error("login polling stopped before a result was delivered")]
    PollInterrupted,
}

/// Configuration failures (project manifest and account config).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("not a satchel project: satchel.toml not found (run `satchel init` first)")]
    NotInitialized,

    #[error("already a satchel project: satchel.toml exists")]
    AlreadyInitialized,

    #[error("not logged in (run `satchel login` first)")]
    NotLoggedIn,

    #[error("unable to determine home directory")]
    NoHomeDir,

    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Rights(#[from] RightsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rule_defined_is_not_a_denial() {
        let gap = RightsError::NoRuleDefined {
            role: "developer".into(),
            environment_type: "prod".into(),
        };
        let denial = RightsError::Denied {
            role: "developer".into(),
            environment: "prod".into(),
            action: "write".into(),
        };

        assert!(matches!(gap, RightsError::NoRuleDefined { .. }));
        assert!(matches!(denial, RightsError::Denied { .. }));
        assert_ne!(gap.to_string(), denial.to_string());
    }

    #[test]
    fn store_errors_render_context() {
        let err = StoreError::EnvironmentNotFound {
            name: "qa".into(),
            available: "default, dev".into(),
        };
        assert!(err.to_string().contains("qa"));
        assert!(err.to_string().contains("default, dev"));
    }
}
