//! `satchel run`.
//!
//! Runs a command with the current environment's resolved secrets (active
//! slot plus local overrides) injected into its environment. The child's
//! exit code becomes ours.

use std::process::Command;

use tracing::debug;

use crate::error::Result;

pub fn run(command: &[String]) -> Result<()> {
    let store = super::store()?;
    let secrets = store.get_secrets()?;

    // clap marks the argument list as required.
    let Some((program, args)) = command.split_first() else {
        return Ok(());
    };

    debug!(program, injected = secrets.len(), "running command");

    let status = Command::new(program)
        .args(args)
        .envs(&secrets)
        .status()?;

    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }

    Ok(())
}
