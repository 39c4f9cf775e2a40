//! `satchel login`.
//!
//! Starts the asynchronous handshake, hands the user a browser URL, then
//! blocks on the poll worker until the provider answers or the budget
//! runs out. The local cipher identity is generated on first login and
//! kept next to the account config.

use std::path::PathBuf;

use age::secrecy::ExposeSecret;
use tracing::debug;

use crate::cli::output;
use crate::core::api::Client;
use crate::core::config::{Account, AccountConfig};
use crate::core::login::{login_url, LoginHandshake, LoginWait};
use crate::error::{ConfigError, Result};

const IDENTITY_FILE: &str = "identity.key";

pub fn login() -> Result<()> {
    let mut config = AccountConfig::load()?;
    let client = Client::new(&config.server_url)?;

    let mut handshake = LoginHandshake::new(client);
    let request = handshake.start()?;
    let url = login_url(&config.server_url, &request.temporary_code);

    output::header("Log in with your identity provider");
    output::item(&url);
    output::dim("waiting for the provider to answer...");

    match handshake.wait()? {
        LoginWait::TimedOut => {
            output::warn("login timed out before the provider answered");
            output::hint("run satchel login again");
            return Ok(());
        }
        LoginWait::Ready(_) => {}
    }

    let public_key = ensure_identity()?;
    let (user, token) = handshake.finish(&public_key)?;

    let username = user.username.clone();
    config.add_account(
        Account {
            account_type: user.account_type,
            user_id: user.user_id,
            ext_id: user.ext_id,
            username: user.username,
            fullname: user.fullname,
            email: user.email,
            public_key,
        },
        token,
    );
    config.save()?;

    output::success(&format!("logged in as {username}"));

    Ok(())
}

fn identity_path() -> Result<PathBuf> {
    let config_path = AccountConfig::default_path()?;
    let dir = config_path.parent().ok_or(ConfigError::NoHomeDir)?;
    Ok(dir.join(IDENTITY_FILE))
}

/// The local cipher identity's public key, generating the identity on
/// first use.
fn ensure_identity() -> Result<String> {
    let path = identity_path()?;

    if path.exists() {
        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
        for line in contents.lines() {
            if let Ok(identity) = line.trim().parse::<age::x25519::Identity>() {
                return Ok(identity.to_public().to_string());
            }
        }
    }

    debug!(path = %path.display(), "generating cipher identity");
    let identity = age::x25519::Identity::generate();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, format!("{}\n", identity.to_string().expose_secret()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(identity.to_public().to_string())
}
