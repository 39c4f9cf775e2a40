//! `satchel push`.
//!
//! Pushing is a write: the caller's role must carry the write permission
//! for the target environment's type before anything leaves the machine.

use crate::cli::output;
use crate::core::config::AccountConfig;
use crate::core::rights::{default_matrix, Action, Role};
use crate::core::sync;
use crate::error::{ConfigError, Result};

pub fn push(environment: Option<&str>) -> Result<()> {
    let store = super::store()?;
    let config = AccountConfig::load()?;
    let client = super::authed_client(&config)?;

    let environment = match environment {
        Some(name) => name.to_string(),
        None => store.current_environment()?,
    };

    let account = config
        .current_account()
        .ok_or(ConfigError::NotLoggedIn)?;

    let project_id = store.manifest()?.project_id;
    let members = client.members(&project_id)?;
    let me = members.iter().find(|m| m.user_id == account.user_id);

    if !me.is_some_and(|m| m.owner) {
        let my_role = me
            .map(|m| m.role.clone())
            .unwrap_or_else(|| Role::new(Role::DEVELOPER));
        default_matrix().require(&my_role, &environment, Action::Write)?;
    }

    let recipients = client.public_keys(&project_id)?;
    let sent = sync::push(&store, &client, &account.user_id, &recipients, &environment)?;

    output::success(&format!(
        "pushed '{environment}' to {sent} member(s)"
    ));

    Ok(())
}
