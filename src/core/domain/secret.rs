//! Reassembled secret view.

use std::collections::BTreeMap;

/// A declared secret with its per-environment values.
///
/// The declaration (name + required flag) lives in the project manifest;
/// values come from the per-environment stores. Environments without a
/// stored value read as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    /// Required secrets may not have an empty value at deploy time.
    pub required: bool,
    /// Environment name to value.
    pub values: BTreeMap<String, String>,
}

impl Secret {
    pub fn value_for(&self, environment: &str) -> &str {
        self.values.get(environment).map(String::as_str).unwrap_or("")
    }
}
