//! `satchel init`.

use crate::cli::output;
use crate::core::manifest::Manifest;
use crate::core::store::DOT_DIR;
use crate::error::{ConfigError, Result};

pub fn init(name: &str, project_id: Option<&str>) -> Result<()> {
    let store = super::store()?;

    if Manifest::exists_in(store.root()) {
        return Err(ConfigError::AlreadyInitialized.into());
    }

    // Without a server-side id the project name doubles as the id until
    // the first push registers it.
    let project_id = project_id.unwrap_or(name);
    store.init(project_id, name)?;

    output::success(&format!("initialized project '{name}'"));
    output::kv("manifest:", "satchel.toml (commit this)");
    output::kv("cache:", format!("{DOT_DIR}/ (gitignored)"));
    output::hint("next: satchel secret set KEY VALUE");

    Ok(())
}
