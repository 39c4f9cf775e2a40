//! Role x environment-type permission matrix.
//!
//! The matrix is closed-world: every (role, environment type) pair a
//! deployment declares must carry an explicit rule. A missing pair is a
//! configuration error ([`RightsError::NoRuleDefined`]), never an implicit
//! deny, so callers can tell a misconfigured deployment apart from a
//! legitimate denial.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, RightsError};

/// A member role within a project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const DEVOPS: &'static str = "devops";
    pub const LEAD_DEV: &'static str = "lead-dev";
    pub const DEVELOPER: &'static str = "developer";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of deployment an environment represents.
///
/// Environments map onto a small set of types ("dev", "staging", "prod");
/// rules are declared per type, not per concrete environment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentType(String);

impl EnvironmentType {
    pub const DEV: &'static str = "dev";
    pub const STAGING: &'static str = "staging";
    pub const PROD: &'static str = "prod";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Type of a concrete environment by name.
    ///
    /// "prod" and "staging" map to themselves; every other environment
    /// (default, dev, ci, ...) is a dev-type environment.
    pub fn for_environment(name: &str) -> Self {
        match name {
            Self::PROD => Self::new(Self::PROD),
            Self::STAGING => Self::new(Self::STAGING),
            _ => Self::new(Self::DEV),
        }
    }
}

impl std::fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An action a member can attempt on an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Invite,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Invite => "invite",
        }
    }
}

/// One rule of the matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub read: bool,
    pub write: bool,
    pub invite: bool,
}

impl PermissionEntry {
    pub const fn new(read: bool, write: bool, invite: bool) -> Self {
        Self { read, write, invite }
    }

    fn allows(&self, action: Action) -> bool {
        match action {
            Action::Read => self.read,
            Action::Write => self.write,
            Action::Invite => self.invite,
        }
    }
}

/// Serialized form of a rule, used when a deployment ships its own table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRule {
    pub role: Role,
    pub environment_type: EnvironmentType,
    #[serde(flatten)]
    pub entry: PermissionEntry,
}

/// The closed-world permission matrix.
#[derive(Debug, Clone, Default)]
pub struct PermissionMatrix {
    entries: BTreeMap<(Role, EnvironmentType), PermissionEntry>,
}

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a matrix from explicit rules.
    pub fn from_rules(rules: impl IntoIterator<Item = PermissionRule>) -> Self {
        let mut matrix = Self::new();
        for rule in rules {
            matrix.insert(rule.role, rule.environment_type, rule.entry);
        }
        matrix
    }

    pub fn insert(&mut self, role: Role, env_type: EnvironmentType, entry: PermissionEntry) {
        self.entries.insert((role, env_type), entry);
    }

    /// Look up the rule for a pair.
    ///
    /// # Errors
    ///
    /// Returns [`RightsError::NoRuleDefined`] when the pair has no rule.
    /// That is a deployment misconfiguration, not a denial.
    pub fn entry(&self, role: &Role, env_type: &EnvironmentType) -> Result<PermissionEntry> {
        self.entries
            .get(&(role.clone(), env_type.clone()))
            .copied()
            .ok_or_else(|| {
                RightsError::NoRuleDefined {
                    role: role.to_string(),
                    environment_type: env_type.to_string(),
                }
                .into()
            })
    }

    /// Whether `role` may perform `action` on an environment of `env_type`.
    pub fn authorize(&self, role: &Role, env_type: &EnvironmentType, action: Action) -> Result<bool> {
        let entry = self.entry(role, env_type)?;
        let allowed = entry.allows(action);

        trace!(
            role = %role,
            environment_type = %env_type,
            action = action.as_str(),
            allowed,
            "authorize"
        );

        Ok(allowed)
    }

    /// Like [`authorize`](Self::authorize) but turns a denial into
    /// [`RightsError::Denied`], for mutation paths that must not proceed.
    pub fn require(
        &self,
        role: &Role,
        environment: &str,
        action: Action,
    ) -> Result<()> {
        let env_type = EnvironmentType::for_environment(environment);
        if self.authorize(role, &env_type, action)? {
            Ok(())
        } else {
            Err(RightsError::Denied {
                role: role.to_string(),
                environment: environment.to_string(),
                action: action.as_str().to_string(),
            }
            .into())
        }
    }

    /// Whether the matrix is total over the given roles and types.
    pub fn is_total(&self, roles: &[Role], env_types: &[EnvironmentType]) -> bool {
        roles.iter().all(|r| {
            env_types
                .iter()
                .all(|t| self.entries.contains_key(&(r.clone(), t.clone())))
        })
    }
}

/// The stock matrix: admin and devops everywhere, lead-dev and developer
/// on dev-type environments only; invites follow the roles that can add
/// members (admin, devops, and lead-dev on dev).
pub fn default_matrix() -> PermissionMatrix {
    let mut m = PermissionMatrix::new();

    let full = PermissionEntry::new(true, true, true);
    let none = PermissionEntry::new(false, false, false);

    for env_type in [
        EnvironmentType::DEV,
        EnvironmentType::STAGING,
        EnvironmentType::PROD,
    ] {
        m.insert(Role::new(Role::ADMIN), EnvironmentType::new(env_type), full);
        m.insert(Role::new(Role::DEVOPS), EnvironmentType::new(env_type), full);
    }

    m.insert(
        Role::new(Role::LEAD_DEV),
        EnvironmentType::new(EnvironmentType::DEV),
        PermissionEntry::new(true, true, true),
    );
    m.insert(
        Role::new(Role::LEAD_DEV),
        EnvironmentType::new(EnvironmentType::STAGING),
        none,
    );
    m.insert(
        Role::new(Role::LEAD_DEV),
        EnvironmentType::new(EnvironmentType::PROD),
        none,
    );

    m.insert(
        Role::new(Role::DEVELOPER),
        EnvironmentType::new(EnvironmentType::DEV),
        PermissionEntry::new(true, true, false),
    );
    m.insert(
        Role::new(Role::DEVELOPER),
        EnvironmentType::new(EnvironmentType::STAGING),
        none,
    );
    m.insert(
        Role::new(Role::DEVELOPER),
        EnvironmentType::new(EnvironmentType::PROD),
        none,
    );

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn developer_can_read_write_dev_but_not_invite() {
        let m = default_matrix();
        let dev = Role::new(Role::DEVELOPER);
        let t = EnvironmentType::new(EnvironmentType::DEV);

        assert!(m.authorize(&dev, &t, Action::Read).unwrap());
        assert!(m.authorize(&dev, &t, Action::Write).unwrap());
        assert!(!m.authorize(&dev, &t, Action::Invite).unwrap());
    }

    #[test]
    fn developer_has_nothing_on_prod() {
        let m = default_matrix();
        let dev = Role::new(Role::DEVELOPER);
        let t = EnvironmentType::new(EnvironmentType::PROD);

        assert!(!m.authorize(&dev, &t, Action::Read).unwrap());
        assert!(!m.authorize(&dev, &t, Action::Write).unwrap());
        assert!(!m.authorize(&dev, &t, Action::Invite).unwrap());
    }

    #[test]
    fn admin_has_everything_everywhere() {
        let m = default_matrix();
        let admin = Role::new(Role::ADMIN);

        for t in [
            EnvironmentType::DEV,
            EnvironmentType::STAGING,
            EnvironmentType::PROD,
        ] {
            let t = EnvironmentType::new(t);
            for action in [Action::Read, Action::Write, Action::Invite] {
                assert!(m.authorize(&admin, &t, action).unwrap());
            }
        }
    }

    #[test]
    fn missing_rule_is_a_configuration_error() {
        let m = default_matrix();
        let ghost = Role::new("ghost");
        let t = EnvironmentType::new(EnvironmentType::DEV);

        let err = m.authorize(&ghost, &t, Action::Read).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Rights(RightsError::NoRuleDefined { .. })
        ));
    }

    #[test]
    fn default_matrix_is_total() {
        let m = default_matrix();
        let roles: Vec<Role> = [Role::ADMIN, Role::DEVOPS, Role::LEAD_DEV, Role::DEVELOPER]
            .into_iter()
            .map(Role::new)
            .collect();
        let types: Vec<EnvironmentType> = [
            EnvironmentType::DEV,
            EnvironmentType::STAGING,
            EnvironmentType::PROD,
        ]
        .into_iter()
        .map(EnvironmentType::new)
        .collect();

        assert!(m.is_total(&roles, &types));
    }

    #[test]
    fn require_distinguishes_denial_from_gap() {
        let m = default_matrix();

        let denied = m
            .require(&Role::new(Role::DEVELOPER), "prod", Action::Write)
            .unwrap_err();
        assert!(matches!(
            denied,
            crate::error::Error::Rights(RightsError::Denied { .. })
        ));

        let gap = m
            .require(&Role::new("ghost"), "prod", Action::Write)
            .unwrap_err();
        assert!(matches!(
            gap,
            crate::error::Error::Rights(RightsError::NoRuleDefined { .. })
        ));
    }

    #[test]
    fn environment_type_mapping() {
        assert_eq!(EnvironmentType::for_environment("prod").as_str(), "prod");
        assert_eq!(
            EnvironmentType::for_environment("staging").as_str(),
            "staging"
        );
        assert_eq!(EnvironmentType::for_environment("default").as_str(), "dev");
        assert_eq!(EnvironmentType::for_environment("ci").as_str(), "dev");
    }

    #[test]
    fn rules_round_trip_through_serde() {
        let rule = PermissionRule {
            role: Role::new(Role::DEVELOPER),
            environment_type: EnvironmentType::new(EnvironmentType::DEV),
            entry: PermissionEntry::new(true, true, false),
        };

        let text = toml::to_string(&rule).unwrap();
        let back: PermissionRule = toml::from_str(&text).unwrap();
        assert_eq!(back.entry, rule.entry);
        assert_eq!(back.role, rule.role);

        let matrix = PermissionMatrix::from_rules([back]);
        assert!(matrix
            .authorize(
                &Role::new(Role::DEVELOPER),
                &EnvironmentType::new(EnvironmentType::DEV),
                Action::Read
            )
            .unwrap());
    }
}
