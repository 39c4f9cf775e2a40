//! `satchel secret`.

use std::collections::BTreeMap;

use console::style;

use crate::cli::output;
use crate::error::Result;

pub fn set(key: &str, value: &str, envs: &[String], required: bool) -> Result<()> {
    let store = super::store()?;

    let targets = if envs.is_empty() {
        store.list_environments()?
    } else {
        envs.to_vec()
    };

    let values: BTreeMap<String, String> = targets
        .into_iter()
        .map(|env| (env, value.to_string()))
        .collect();

    store.add_secret(key, &values, required)?;

    output::success(&format!("set {key} in {} environment(s)", values.len()));

    Ok(())
}

pub fn show(key: &str) -> Result<()> {
    let store = super::store()?;
    let secret = store.get_secret(key)?;

    output::header(&secret.name);
    if secret.required {
        output::dim("required");
    }
    for (environment, value) in &secret.values {
        output::kv(environment, value);
    }

    Ok(())
}

pub fn rm(key: &str) -> Result<()> {
    let store = super::store()?;
    store.remove_secret(key)?;

    output::success(&format!("removed {key}"));

    Ok(())
}

pub fn list() -> Result<()> {
    let store = super::store()?;
    let secrets = store.list_secrets()?;

    if secrets.is_empty() {
        output::dim("no secrets declared");
        return Ok(());
    }

    for secret in secrets {
        let marker = if secret.required {
            style("required").yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {}  {} environment(s)  {}",
            style(&secret.name).bold(),
            secret.values.len(),
            marker
        );
    }

    Ok(())
}

pub fn set_required(key: &str, required: bool) -> Result<()> {
    let store = super::store()?;
    store.mark_secret_required(key, required)?;

    let state = if required { "required" } else { "optional" };
    output::success(&format!("{key} is now {state}"));

    Ok(())
}
