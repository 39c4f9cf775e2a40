//! `satchel file`.

use std::collections::BTreeMap;

use crate::cli::output;
use crate::error::Result;

pub fn add(path: &str) -> Result<()> {
    let store = super::store()?;

    // The working-tree content seeds every environment.
    let contents = std::fs::read(store.root().join(path))?;
    let mut other_environments = BTreeMap::new();
    for environment in store.list_environments()? {
        other_environments.insert(environment, contents.clone());
    }

    store.add_file(path, &other_environments)?;

    output::success(&format!("tracking {path}"));
    output::dim("the working-tree copy is now a link into the environment cache");

    Ok(())
}

pub fn rm(path: &str, force: bool) -> Result<()> {
    let store = super::store()?;
    store.remove_file(path, force)?;

    output::success(&format!("no longer tracking {path}"));
    output::dim("cached copies deleted from every environment");

    Ok(())
}

pub fn list() -> Result<()> {
    let store = super::store()?;
    let files = store.list_files()?;

    if files.is_empty() {
        output::dim("no tracked files");
        return Ok(());
    }

    for path in files {
        output::item(path);
    }

    Ok(())
}
