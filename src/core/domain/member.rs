//! Project membership.

use serde::{Deserialize, Serialize};

use crate::core::rights::Role;

/// A user's membership in a project.
///
/// `owner` is distinct from the role: the project owner keeps owner
/// privileges whatever role the matrix assigns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMember {
    pub user_id: String,
    pub project_id: String,
    pub role: Role,
    /// Environment scope the membership applies to, when restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default)]
    pub owner: bool,
}
