//! `satchel env`.

use console::style;

use crate::cli::output;
use crate::error::Result;

pub fn list() -> Result<()> {
    let store = super::store()?;
    let current = store.current_environment()?;

    for name in store.list_environments()? {
        if name == current {
            println!("{} {}", style("*").green(), style(&name).bold());
        } else {
            println!("  {name}");
        }
    }

    Ok(())
}

pub fn new(name: &str) -> Result<()> {
    let store = super::store()?;
    store.create_environment(name)?;

    output::success(&format!("created environment '{name}'"));
    output::hint(&format!("switch with: satchel env switch {name}"));

    Ok(())
}

pub fn rm(name: &str) -> Result<()> {
    let store = super::store()?;
    store.remove_environment(name)?;

    output::success(&format!("removed environment '{name}'"));

    Ok(())
}

pub fn switch(name: &str) -> Result<()> {
    let store = super::store()?;
    store.set_current(name)?;

    output::success(&format!("switched to '{name}'"));

    Ok(())
}
