//! `satchel member`.
//!
//! Adding a member is gated client-side: the caller's own role must carry
//! the invite permission for the environment scope of the invite. The
//! server enforces the same matrix; the local check just fails fast.

use console::style;

use crate::cli::output;
use crate::core::api::MemberRole;
use crate::core::config::AccountConfig;
use crate::core::rights::{default_matrix, Action, Role};
use crate::core::store::DEFAULT_ENVIRONMENT;
use crate::error::{ConfigError, Result};

pub fn list() -> Result<()> {
    let store = super::store()?;
    let config = AccountConfig::load()?;
    let client = super::authed_client(&config)?;

    let project_id = store.manifest()?.project_id;
    let members = client.members(&project_id)?;

    if members.is_empty() {
        output::dim("no members");
        return Ok(());
    }

    for member in members {
        let owner = if member.owner { " (owner)" } else { "" };
        println!(
            "  {}  {}{}",
            style(&member.user_id).bold(),
            member.role,
            style(owner).dim()
        );
    }

    Ok(())
}

pub fn add(user_id: &str, role: &str, environment: Option<&str>) -> Result<()> {
    let store = super::store()?;
    let config = AccountConfig::load()?;
    let client = super::authed_client(&config)?;

    let project_id = store.manifest()?.project_id;
    let environment = environment.unwrap_or(DEFAULT_ENVIRONMENT);

    let account = config
        .current_account()
        .ok_or(ConfigError::NotLoggedIn)?;
    let members = client.members(&project_id)?;
    let me = members
        .iter()
        .find(|m| m.user_id == account.user_id);

    // Owners bypass the matrix.
    if !me.is_some_and(|m| m.owner) {
        let my_role = me
            .map(|m| m.role.clone())
            .unwrap_or_else(|| Role::new(Role::DEVELOPER));
        default_matrix().require(&my_role, environment, Action::Invite)?;
    }

    client.add_members(
        &project_id,
        &[MemberRole {
            user_id: user_id.to_string(),
            role: Role::new(role),
        }],
    )?;

    output::success(&format!("added {user_id} as {role}"));

    Ok(())
}

pub fn rm(user_id: &str) -> Result<()> {
    let store = super::store()?;
    let config = AccountConfig::load()?;
    let client = super::authed_client(&config)?;

    let project_id = store.manifest()?.project_id;

    let account = config
        .current_account()
        .ok_or(ConfigError::NotLoggedIn)?;
    let members = client.members(&project_id)?;
    let me = members
        .iter()
        .find(|m| m.user_id == account.user_id);

    if !me.is_some_and(|m| m.owner) {
        let my_role = me
            .map(|m| m.role.clone())
            .unwrap_or_else(|| Role::new(Role::DEVELOPER));
        default_matrix().require(&my_role, DEFAULT_ENVIRONMENT, Action::Invite)?;
    }

    client.remove_member(&project_id, user_id)?;

    output::success(&format!("removed {user_id}"));

    Ok(())
}
