//! `satchel fetch`.

use crate::cli::output;
use crate::core::config::AccountConfig;
use crate::core::sync::{self, FetchOutcome, RecordingMerger};
use crate::error::Result;

pub fn fetch(environment: Option<&str>) -> Result<()> {
    let store = super::store()?;
    let config = AccountConfig::load()?;
    let client = super::authed_client(&config)?;

    let environment = match environment {
        Some(name) => name.to_string(),
        None => store.current_environment()?,
    };

    let mut merger = RecordingMerger::default();
    match sync::fetch(&store, &client, &mut merger, &environment)? {
        FetchOutcome::UpToDate => {
            output::success(&format!("'{environment}' is up to date"));
        }
        FetchOutcome::Updated {
            version_id,
            message_count,
        } => {
            output::success(&format!(
                "'{environment}' moved to version {version_id} ({message_count} message(s))"
            ));
        }
    }

    Ok(())
}
